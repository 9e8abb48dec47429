use serde::{Deserialize, Serialize};

/// JWT claims issued to a user. `role` is `staff` for kitchen/front-desk staff.
#[derive(Debug, Deserialize, Serialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}
