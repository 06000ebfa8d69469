use uuid::Uuid;

pub type Id = String;

/// Generate a fresh random internal identifier (UUID v4).
pub fn generate_id() -> Id {
    Uuid::new_v4().to_string()
}
