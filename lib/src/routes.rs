pub const HOME: &str = "/";

pub const LOGIN: &str = "/login";
pub const LOGOUT: &str = "/logout";

pub const SEND_UPDATE: &str = "/send_update";
