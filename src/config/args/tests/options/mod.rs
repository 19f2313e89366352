mod exception_header;
mod retry;
mod target;
mod tracing;
mod transfer;
