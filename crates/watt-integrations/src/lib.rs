pub mod http;
pub mod supabase;
pub mod traits;

pub use supabase::SupabaseClient;
pub use traits::{SessionEntry, SessionSink, SinkError};
