/// Evaluate the expression and return it along with the time it took.
/// ```rust,ignore
/// let (balance, elapsed) = measure_duration!(client.fetch_token_balance(token, owner).await);
/// ```
#[macro_export]
macro_rules! measure_duration {
    ($e: expr) => {{
        let started_at = std::time::Instant::now();

        let result = $e;
        (result, started_at.elapsed())
    }};
}

/// Emit a metric as a tracing event. Events are picked up by the [`crate::service::monitoring::Metric`] layer
/// when it is installed and are plain debug events otherwise.
///
/// Supported forms
///  - `metric!(counter[name] = 1, field = value)`
///  - `metric!(gauge[name] = 3)`
///  - `metric!(histogram[name] = elapsed.as_millis())`
///  - `metric!(on error result => counter[name] = 1)` which only fires when `result` is an `Err`
#[macro_export]
macro_rules! metric {
    (counter [ $label: ident ] = $i: expr $(,$field: ident = $value: expr)*) => {
        $crate::service::tracing::debug!(monotonic_counter.$label = $i, $($field = $value),*)
    };
    (on error $e: expr => counter [ $label: ident ] = $i: expr $(,$field: ident = $value: expr)*) => {
        if let Err(ref e) = $e {
            $crate::service::tracing::debug!(monotonic_counter.$label = $i, $($field = $value,)* error = e.to_string());
        }
    };
    (gauge [ $label: ident ] = $i: expr $(,$field: ident = $value: expr)*) => {
        $crate::service::tracing::debug!(gauge.$label = $i, $($field = $value),*)
    };
    (histogram [ $label: ident ] = $i: expr $(,$field: ident = $value: expr)*) => {
        $crate::service::tracing::debug!(histogram.$label = $i as f64, $($field = $value),*)
    };
}
