//! Solidity interfaces used by the bot

use alloy::sol;

sol! {
    #[derive(Debug)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256 balance);
        function allowance(address owner, address spender) external view returns (uint256 remaining);
        function approve(address spender, uint256 amount) external returns (bool success);
    }

    #[derive(Debug)]
    interface IUniswapV3Pool {
        function slot0() external view returns (uint160 sqrtPriceX96, int24 tick, uint16 observationIndex, uint16 observationCardinality, uint16 observationCardinalityNext, uint8 feeProtocol, bool unlocked);
        function token0() external view returns (address token);
        function token1() external view returns (address token);
    }

    #[derive(Debug)]
    interface IAlgebraPool {
        function globalState() external view returns (uint160 price, int24 tick, uint16 fee, uint16 timepointIndex, uint8 communityFeeToken0, uint8 communityFeeToken1, bool unlocked);
    }

    #[derive(Debug)]
    interface IPassthroughRouter {
        function swap(address pool, address recipient, bool zeroForOne, int256 amountSpecified, uint160 sqrtPriceLimitX96, bytes data) external returns (int256 amount0, int256 amount1);
    }

    #[derive(Debug)]
    interface IAlgebraRouter {
        struct ExactInputSingleParams {
            address tokenIn;
            address tokenOut;
            address recipient;
            uint256 deadline;
            uint256 amountIn;
            uint256 amountOutMinimum;
            uint160 limitSqrtPrice;
        }

        struct ExactOutputSingleParams {
            address tokenIn;
            address tokenOut;
            uint24 fee;
            address recipient;
            uint256 deadline;
            uint256 amountOut;
            uint256 amountInMaximum;
            uint160 limitSqrtPrice;
        }

        function exactInputSingle(ExactInputSingleParams params) external payable returns (uint256 amountOut);
        function exactOutputSingle(ExactOutputSingleParams params) external payable returns (uint256 amountIn);
    }

    #[derive(Debug)]
    interface IBatchRouter {
        struct SwapPathStep {
            address pool;
            address tokenOut;
            bool isBuffer;
        }

        struct SwapPathExactAmountIn {
            address tokenIn;
            SwapPathStep[] steps;
            uint256 exactAmountIn;
            uint256 minAmountOut;
        }

        struct SwapPathExactAmountOut {
            address tokenIn;
            SwapPathStep[] steps;
            uint256 maxAmountIn;
            uint256 exactAmountOut;
        }

        function swapExactIn(SwapPathExactAmountIn[] paths, uint256 deadline, bool wethIsEth, bytes userData) external payable returns (uint256[] pathAmountsOut, address[] tokensOut, uint256[] amountsOut);
        function querySwapExactIn(SwapPathExactAmountIn[] paths, address sender, bytes userData) external returns (uint256[] pathAmountsOut, address[] tokensOut, uint256[] amountsOut);
        function querySwapExactOut(SwapPathExactAmountOut[] paths, address sender, bytes userData) external returns (uint256[] pathAmountsIn, address[] tokensIn, uint256[] amountsIn);
    }

    #[derive(Debug)]
    interface IPermit2 {
        function approve(address token, address spender, uint160 amount, uint48 expiration) external;
        function allowance(address user, address token, address spender) external view returns (uint160 amount, uint48 expiration, uint48 nonce);
    }

    #[derive(Debug)]
    interface IFutarchyRouter {
        function splitPosition(address proposal, address collateralToken, uint256 amount) external;
        function mergePositions(address proposal, address collateralToken, uint256 amount) external;
    }

    #[derive(Debug)]
    interface IERC4626 {
        function deposit(uint256 assets, address receiver) external returns (uint256 shares);
        function redeem(uint256 shares, address receiver, address owner) external returns (uint256 assets);
        function convertToAssets(uint256 shares) external view returns (uint256 assets);
    }
}
