/// Runs `$call`, logging and re-raising any error through `tracing` so every
/// fallible call site gets a span without hand-written boilerplate.
#[macro_export]
macro_rules! trace_call_result {
    ( expr: $call:expr, function_name: $function_name:expr ) => {{
        const FUNCTION_NAME: &'static str = $function_name;
        let span = ::tracing::trace_span!(FUNCTION_NAME);
        let _guard = span.enter();
        match $call {
            ::std::result::Result::Ok(x) => ::std::result::Result::Ok(x),
            ::std::result::Result::Err(err) => {
                ::tracing::debug!(error = %err, "{} failed", FUNCTION_NAME);
                ::std::result::Result::Err(err)
            }
        }
    }};
    ( $receiver:tt . $i:ident ( $( $arg:expr ),* $(,)? ) ) => {
        $crate::trace_call_result!( expr: $receiver . $i ( $( $arg, )* ) , function_name: stringify!($i) )
    };
}

/// Upcasts an error to `dyn Error + 'static` so it can be attached as a
/// structured field on a `tracing` event.
pub fn error_value<T: std::error::Error + 'static>(e: &T) -> &(dyn std::error::Error + 'static) {
    e
}

/// Initializes the global `tracing` subscriber from `XSH_LOG`, falling back
/// to `warn` level output. Mirrors the env-filter setup every front-end
/// (REPL, daemon, web server) shares.
pub fn init_logging(debug: bool) -> tracing::dispatcher::DefaultGuard {
    use tracing_subscriber::{prelude::*, EnvFilter};

    let filter = match std::env::var("XSH_LOG") {
        Ok(value) => EnvFilter::try_new(value).unwrap_or_else(|_| EnvFilter::new("warn")),
        Err(_) if debug => EnvFilter::new("debug"),
        Err(_) => EnvFilter::new("warn"),
    };

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).without_time());

    tracing::subscriber::set_default(subscriber)
}
