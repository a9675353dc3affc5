mod context;

pub use context::AuthContext;
