// Front end surface
//
// - page: element identifiers and the in-memory page they live on
// - view: the view controller (login / signup / dashboard, banners, buttons)
// - render: text drawing of whatever is visible
// - download: where finished subtitle files end up

pub mod download;
pub mod page;
pub mod render;
pub mod view;

pub use download::Downloads;
pub use page::{Element, ElementId, InputType, Page};
pub use render::render;
pub use view::{AuthForm, ErrorScope, ViewController, ViewState, BANNER_TIMEOUT};
