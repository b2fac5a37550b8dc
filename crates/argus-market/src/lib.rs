pub mod evds;
pub mod frame;
pub mod market;
pub mod normalize;
pub mod period;
pub mod reply;
pub mod settings;
pub mod symbol;
pub mod tradingview;
pub mod value;
pub mod yahoo;

mod de;

pub use crate::frame::{Column, Frame, Row, RowKey};
pub use crate::market::{Connector, Market};
pub use crate::reply::{Exportable, FastInfo, Reply};
pub use crate::settings::Settings;
pub use crate::value::{Datum, Mapping, Scalar};
pub use crate::yahoo::YahooConnector;
