use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

/// Placeholder used when a recipe is created without an image.
pub const DEFAULT_IMAGE: &str = "https://images.media-allrecipes.com/images/75131.jpg";

/// Largest integer an `f64` holds exactly (2^53).
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Store-assigned recipe identifier (UUIDv7, so ids sort by creation time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeId(Uuid);

impl RecipeId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parses a path segment; anything that is not a UUID yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }
}

impl Default for RecipeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for RecipeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    #[serde(rename = "Easy Peasy")]
    EasyPeasy,
    #[serde(rename = "Amateur Chef")]
    AmateurChef,
    #[serde(rename = "UltraPro Chef")]
    UltraProChef,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::EasyPeasy, Level::AmateurChef, Level::UltraProChef];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::EasyPeasy => "Easy Peasy",
            Level::AmateurChef => "Amateur Chef",
            Level::UltraProChef => "UltraPro Chef",
        }
    }

    /// Exact, case-sensitive match against the three labels.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.as_str() == label)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted recipe as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: RecipeId,
    pub title: String,
    pub instructions: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    pub image: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_duration"
    )]
    pub duration: Option<f64>,
    pub is_archived: bool,
    pub created: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Recipe {
    /// Builds the stored record for a validated creation input.
    pub fn from_new(id: RecipeId, new: NewRecipe, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: new.title,
            instructions: new.instructions,
            level: new.level,
            ingredients: new.ingredients,
            image: new.image,
            duration: new.duration,
            is_archived: new.is_archived,
            created: now,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Whole durations are written as JSON integers, so `25` comes back as `25`.
fn serialize_duration<S: Serializer>(
    duration: &Option<f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match duration {
        Some(minutes) if minutes.fract() == 0.0 && minutes.abs() <= MAX_EXACT_INTEGER => {
            serializer.serialize_some(&(*minutes as i64))
        }
        Some(minutes) => serializer.serialize_some(minutes),
        None => serializer.serialize_none(),
    }
}

/// Validated creation input with defaults already applied.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecipe {
    pub title: String,
    pub instructions: String,
    pub level: Option<Level>,
    pub ingredients: Vec<String>,
    pub image: String,
    pub duration: Option<f64>,
    pub is_archived: bool,
}

/// Validated partial update; `None` leaves a field untouched.
///
/// `level` and `duration` are nullable: `Some(None)` clears them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipePatch {
    pub title: Option<String>,
    pub instructions: Option<String>,
    pub level: Option<Option<Level>>,
    pub ingredients: Option<Vec<String>>,
    pub image: Option<String>,
    pub duration: Option<Option<f64>>,
    pub is_archived: Option<bool>,
}

impl RecipePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies the patch in place. `id`, `created` and the store-managed
    /// timestamps are never touched.
    pub fn apply_to(self, recipe: &mut Recipe) {
        if let Some(title) = self.title {
            recipe.title = title;
        }
        if let Some(instructions) = self.instructions {
            recipe.instructions = instructions;
        }
        if let Some(level) = self.level {
            recipe.level = level;
        }
        if let Some(ingredients) = self.ingredients {
            recipe.ingredients = ingredients;
        }
        if let Some(image) = self.image {
            recipe.image = image;
        }
        if let Some(duration) = self.duration {
            recipe.duration = duration;
        }
        if let Some(is_archived) = self.is_archived {
            recipe.is_archived = is_archived;
        }
    }
}
