pub mod audit;
mod constants;
pub mod crypto_tools;
pub mod election;
pub mod mixnet;
pub mod sdk;
pub mod token;
