pub mod fake_server;
pub mod socket_guard;
