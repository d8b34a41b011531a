// acctpanel services
// Services provide the stateless-ish machinery: sorting, bulk action dispatch, settings.

pub mod bulk_dispatcher;
pub mod settings_engine;
pub mod sort_engine;
