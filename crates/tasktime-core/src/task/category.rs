use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryColor {
    pub bg: String,
    pub text: String,
}

impl CategoryColor {
    pub fn new(bg: &str, text: &str) -> Self {
        Self {
            bg: bg.to_string(),
            text: text.to_string(),
        }
    }
}

/// A task category. Seeded defaults have `is_custom == false` and cannot be deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub color: CategoryColor,
    pub icon: String,
    #[serde(default)]
    pub is_custom: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub color: CategoryColor,
    pub icon: String,
}

/// Editable category fields. `is_custom` cannot be changed after creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub color: Option<CategoryColor>,
    pub icon: Option<String>,
}

/// Categories seeded on first run.
pub fn default_categories() -> Vec<Category> {
    const SEED: [(&str, &str, &str, &str, &str); 6] = [
        ("work", "Work", "#A67BC1", "#FFFFFF", "💼"),
        ("code", "Code", "#FF7A7A", "#FFFFFF", "💻"),
        ("reading", "Reading", "#56E0C0", "#17171F", "📚"),
        ("sport", "Sport", "#FFA26B", "#17171F", "🏋️"),
        ("study", "Study", "#56ACB2", "#FFFFFF", "🎓"),
        ("personal", "Personal", "#7A85FF", "#FFFFFF", "🌱"),
    ];

    SEED.iter()
        .map(|(id, name, bg, text, icon)| Category {
            id: id.to_string(),
            name: name.to_string(),
            color: CategoryColor::new(bg, text),
            icon: icon.to_string(),
            is_custom: false,
        })
        .collect()
}
