//! Production recipes.

use serde::{Deserialize, Serialize};

use crate::resources::ResourceKind;

/// Ordered list of input kinds; a kind may repeat to require several units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recipe {
    inputs: Vec<ResourceKind>,
}

impl Recipe {
    pub fn new(inputs: Vec<ResourceKind>) -> Self {
        Self { inputs }
    }

    pub fn inputs(&self) -> &[ResourceKind] {
        &self.inputs
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Whether items of `kind` are ever consumed by this recipe.
    pub fn accepts(&self, kind: ResourceKind) -> bool {
        self.inputs.contains(&kind)
    }
}

impl From<Vec<ResourceKind>> for Recipe {
    fn from(inputs: Vec<ResourceKind>) -> Self {
        Self::new(inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ResourceKind::*;

    #[test]
    fn test_accepts_only_listed_kinds() {
        let recipe = Recipe::new(vec![Resource1, Resource1, Resource2]);
        assert!(recipe.accepts(Resource1));
        assert!(recipe.accepts(Resource2));
        assert!(!recipe.accepts(Resource3));
        assert_eq!(recipe.len(), 3);
    }

    #[test]
    fn test_deserializes_from_plain_list() {
        let recipe: Recipe = serde_json::from_str(r#"["Resource1","Resource3"]"#).unwrap();
        assert_eq!(recipe.inputs(), &[Resource1, Resource3]);
    }
}
