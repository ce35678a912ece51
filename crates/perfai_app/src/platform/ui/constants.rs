/// Core web vitals shown in the report, as `(key, label)`.
pub const PERFORMANCE_METRICS: &[(&str, &str)] = &[
    ("lcp", "Largest Contentful Paint"),
    ("cls", "Cumulative Layout Shift"),
    ("inp", "Interaction to Next Paint"),
    ("ttfb", "Time to First Byte"),
    ("fcp", "First Contentful Paint"),
    ("si", "Speed Index"),
    ("tbt", "Total Blocking Time"),
];

/// Seconds.
pub const LCP_WARN_THRESHOLD: f64 = 2.5;
pub const CLS_WARN_THRESHOLD: f64 = 0.1;

pub const MISSING_VALUE: &str = "---";
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";
pub const URL_COLUMN_WIDTH: usize = 48;
pub const ENDPOINT_COLUMN_WIDTH: usize = 40;
