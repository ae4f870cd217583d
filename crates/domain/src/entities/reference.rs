//! Relations that arrive either embedded or as a bare id.

use serde::{Deserialize, Serialize};

use crate::collections::Identified;

/// A reference to another entity.
///
/// List endpoints embed the related document while mutation endpoints often
/// echo back only its id; both shapes decode into this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference<I, T> {
    Id(I),
    Embedded(T),
}

impl<I, T> Reference<I, T>
where
    T: Identified<Id = I>,
{
    pub fn id(&self) -> &I {
        match self {
            Self::Id(id) => id,
            Self::Embedded(entity) => entity.id(),
        }
    }

    pub fn embedded(&self) -> Option<&T> {
        match self {
            Self::Id(_) => None,
            Self::Embedded(entity) => Some(entity),
        }
    }
}
