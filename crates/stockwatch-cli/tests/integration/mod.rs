mod config_commands;
mod http_flow;
mod watch_flow;
