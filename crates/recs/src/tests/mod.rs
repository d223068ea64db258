//! Engine-level tests exercising the service and trainer against an
//! in-memory store adapter

mod support;

mod service_test;
