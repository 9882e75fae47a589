use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

use super::model::{DEFAULT_IMAGE, Level, NewRecipe, RecipePatch};

/// A single field-level rule violation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Violation {
    #[error("recipe must be a JSON object")]
    NotAnObject,
    #[error("`{0}` is required")]
    Required(&'static str),
    #[error("`{field}` must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("`{0}` is not a valid value for `level`")]
    InvalidLevel(String),
    #[error("`duration` ({0}) must be greater than or equal to 0")]
    NegativeDuration(f64),
}

/// Every violation found in one payload, in field order.
#[derive(Debug, Clone, PartialEq, Error)]
pub struct ValidationErrors(Vec<Violation>);

impl ValidationErrors {
    pub fn violations(&self) -> &[Violation] {
        &self.0
    }

    #[cfg(test)]
    pub fn contains(&self, violation: &Violation) -> bool {
        self.0.contains(violation)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Recipe validation failed: ")?;
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

/// Validates a creation payload and applies the create-time defaults.
pub fn validate_for_create(input: &Value) -> Result<NewRecipe, ValidationErrors> {
    let mut reader = FieldReader::new(input, Mode::Create)?;

    let title = reader.required_text("title");
    let instructions = reader.required_text("instructions");
    let level = reader.level().flatten();
    let ingredients = reader.ingredients().unwrap_or_default();
    let image = reader.string("image");
    let duration = reader.duration().flatten();
    let is_archived = reader.boolean("isArchived");

    reader.finish()?;

    match (title, instructions) {
        (Some(title), Some(instructions)) => Ok(NewRecipe {
            title,
            instructions,
            level,
            ingredients,
            image: image.unwrap_or_else(|| DEFAULT_IMAGE.to_string()),
            duration,
            is_archived: is_archived.unwrap_or(false),
        }),
        // finish() already failed if either was missing
        _ => Err(ValidationErrors(vec![Violation::Required("title")])),
    }
}

/// Validates a partial update. Only provided fields are checked; `id` and
/// the timestamps are ignored so they can never be overwritten.
pub fn validate_for_update(input: &Value) -> Result<RecipePatch, ValidationErrors> {
    let mut reader = FieldReader::new(input, Mode::Update)?;

    let patch = RecipePatch {
        title: reader.required_text("title"),
        instructions: reader.required_text("instructions"),
        level: reader.level(),
        ingredients: reader.ingredients(),
        image: reader.string("image"),
        duration: reader.duration(),
        is_archived: reader.boolean("isArchived"),
    };

    reader.finish()?;
    Ok(patch)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Create,
    Update,
}

enum Slot<'a> {
    Absent,
    Null,
    Present(&'a Value),
}

struct FieldReader<'a> {
    object: &'a Map<String, Value>,
    mode: Mode,
    violations: Vec<Violation>,
}

impl<'a> FieldReader<'a> {
    fn new(input: &'a Value, mode: Mode) -> Result<Self, ValidationErrors> {
        let object = input
            .as_object()
            .ok_or_else(|| ValidationErrors(vec![Violation::NotAnObject]))?;

        Ok(Self {
            object,
            mode,
            violations: Vec::new(),
        })
    }

    fn slot(&self, field: &str) -> Slot<'a> {
        match self.object.get(field) {
            None => Slot::Absent,
            Some(Value::Null) => Slot::Null,
            Some(value) => Slot::Present(value),
        }
    }

    fn reject(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Null on create means "not provided"; on update it is only meaningful
    /// for nullable fields, so it is a type error everywhere else.
    fn null_not_allowed(&mut self, field: &'static str, expected: &'static str) {
        if self.mode == Mode::Update {
            self.reject(Violation::WrongType { field, expected });
        }
    }

    fn required_text(&mut self, field: &'static str) -> Option<String> {
        match self.slot(field) {
            Slot::Absent => {
                if self.mode == Mode::Create {
                    self.reject(Violation::Required(field));
                }
                None
            }
            Slot::Null => {
                self.reject(Violation::Required(field));
                None
            }
            Slot::Present(Value::String(text)) if text.trim().is_empty() => {
                self.reject(Violation::Required(field));
                None
            }
            Slot::Present(Value::String(text)) => Some(text.clone()),
            Slot::Present(_) => {
                self.reject(Violation::WrongType {
                    field,
                    expected: "a string",
                });
                None
            }
        }
    }

    fn string(&mut self, field: &'static str) -> Option<String> {
        match self.slot(field) {
            Slot::Absent => None,
            Slot::Null => {
                self.null_not_allowed(field, "a string");
                None
            }
            Slot::Present(Value::String(text)) => Some(text.clone()),
            Slot::Present(_) => {
                self.reject(Violation::WrongType {
                    field,
                    expected: "a string",
                });
                None
            }
        }
    }

    fn boolean(&mut self, field: &'static str) -> Option<bool> {
        match self.slot(field) {
            Slot::Absent => None,
            Slot::Null => {
                self.null_not_allowed(field, "a boolean");
                None
            }
            Slot::Present(Value::Bool(flag)) => Some(*flag),
            Slot::Present(_) => {
                self.reject(Violation::WrongType {
                    field,
                    expected: "a boolean",
                });
                None
            }
        }
    }

    fn ingredients(&mut self) -> Option<Vec<String>> {
        const EXPECTED: &str = "an array of strings";

        match self.slot("ingredients") {
            Slot::Absent => None,
            Slot::Null => {
                self.null_not_allowed("ingredients", EXPECTED);
                None
            }
            Slot::Present(Value::Array(items)) => {
                let parsed: Option<Vec<String>> = items
                    .iter()
                    .map(|item| item.as_str().map(str::to_owned))
                    .collect();
                if parsed.is_none() {
                    self.reject(Violation::WrongType {
                        field: "ingredients",
                        expected: EXPECTED,
                    });
                }
                parsed
            }
            Slot::Present(_) => {
                self.reject(Violation::WrongType {
                    field: "ingredients",
                    expected: EXPECTED,
                });
                None
            }
        }
    }

    fn level(&mut self) -> Option<Option<Level>> {
        match self.slot("level") {
            Slot::Absent => None,
            Slot::Null => Some(None),
            Slot::Present(Value::String(label)) => match Level::from_label(label) {
                Some(level) => Some(Some(level)),
                None => {
                    self.reject(Violation::InvalidLevel(label.clone()));
                    None
                }
            },
            Slot::Present(_) => {
                self.reject(Violation::WrongType {
                    field: "level",
                    expected: "one of \"Easy Peasy\", \"Amateur Chef\", \"UltraPro Chef\"",
                });
                None
            }
        }
    }

    fn duration(&mut self) -> Option<Option<f64>> {
        match self.slot("duration") {
            Slot::Absent => None,
            Slot::Null => Some(None),
            Slot::Present(Value::Number(number)) => match number.as_f64() {
                Some(minutes) if minutes < 0.0 => {
                    self.reject(Violation::NegativeDuration(minutes));
                    None
                }
                Some(minutes) => Some(Some(minutes)),
                None => {
                    self.reject(Violation::WrongType {
                        field: "duration",
                        expected: "a number",
                    });
                    None
                }
            },
            Slot::Present(_) => {
                self.reject(Violation::WrongType {
                    field: "duration",
                    expected: "a number",
                });
                None
            }
        }
    }

    fn finish(self) -> Result<(), ValidationErrors> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.violations))
        }
    }
}
