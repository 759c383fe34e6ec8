pub mod url_probe;
pub mod webhook_client;
