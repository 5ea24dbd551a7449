/// Field whose value may be assigned by the storage engine.
///
/// `NotSet` fields are left out of `INSERT` statements so that the column
/// receives its engine side value (identity or `DEFAULT`).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Passive<T> {
    Set(T),
    #[default]
    NotSet,
}

impl<T> Passive<T> {
    pub fn is_set(&self) -> bool {
        matches!(self, Passive::Set(..))
    }

    pub fn as_option(&self) -> Option<&T> {
        match self {
            Passive::Set(v) => Some(v),
            Passive::NotSet => None,
        }
    }
}

impl<T> From<T> for Passive<T> {
    fn from(value: T) -> Self {
        Self::Set(value)
    }
}
