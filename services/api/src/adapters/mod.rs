pub mod db;
pub mod google_books;
pub mod supabase_auth;
pub mod supabase_storage;
pub mod theme_file;

pub use db::DbAdapter;
pub use google_books::GoogleBooksAdapter;
pub use supabase_auth::SupabaseAuthAdapter;
pub use supabase_storage::SupabaseStorageAdapter;
pub use theme_file::FileThemeAdapter;
