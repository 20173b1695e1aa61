//! Credential service adapters

pub mod supabase;

pub use supabase::SupabaseTokenProvider;
