mod trend;

pub use trend::{Category, Keyword, Trend, TrendType};
