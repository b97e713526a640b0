pub mod request;
pub mod response;

/// Topic names as they appear on the wire.
pub mod topic {
    pub const CRYPTO_PRICES: &str = "crypto_prices";
    pub const CHAINLINK_PRICES: &str = "crypto_prices_chainlink";
    pub const COMMENTS: &str = "comments";
    pub const ACTIVITY: &str = "activity";
    /// Private order and trade events, needs `clob_auth`
    pub const CLOB_USER: &str = "clob_user";
}
