// gatelink-api: raw TCP channel to gate/access controllers

pub mod channel;
pub mod error;

pub use channel::{
    Channel, Connector, DEFAULT_CONNECT_TIMEOUT, DEFAULT_PORT, DEFAULT_RECEIVE_TIMEOUT, Endpoint,
    READ_CHUNK_SIZE, TcpChannel, TcpConnector,
};
pub use error::Error;
