// 認証機能モジュール

pub mod models;
pub mod service;
pub mod session;

pub use models::{
    CreateUserRequest, CreateUserResponse, LoginRequest, LoginResponse, LoginUserRecord,
    SessionUser,
};
pub use service::{AuthGateway, AuthService};
pub use session::SessionStore;
