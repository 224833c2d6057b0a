pub mod coindesk;
pub mod coinmarketcap;
pub mod cryptocompare;
pub mod util;

pub use coindesk::CoindeskProvider;
pub use coinmarketcap::CoinMarketCapProvider;
pub use cryptocompare::CryptoCompareProvider;
