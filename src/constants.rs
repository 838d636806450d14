pub mod limits {

    pub const DEFAULT_LIMIT: usize = 100;

    pub const MIN_LIMIT: usize = 1;

    pub const MAX_LIMIT: usize = 1000;

    pub const HOME_RECENT_COUNT: usize = 15;
}

pub mod paths {

    pub const API_PREFIX: &str = "/api";

    pub const THUMBS_PREFIX: &str = "/thumbs";
}
