pub mod logging;
pub mod metrics;
pub mod trace_context;

pub use logging::init_tracing;
pub use metrics::{init_metrics, metrics_handler, render_metrics};
pub use trace_context::{TRACEPARENT_HEADER, TracedClientExt, TracedRequest, inject_trace_context};
