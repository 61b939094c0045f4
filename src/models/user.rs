/// Represents a user row in the credential store.
#[derive(Clone, Debug)]
pub struct User {
    /// The unique identifier for the user.
    pub id: i32,
    /// The user's display name.
    pub name: String,
    /// The user's Argon2 password hash (PHC string).
    pub password: String,
}
