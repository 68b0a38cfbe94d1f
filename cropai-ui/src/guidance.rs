//! Treatment guidance
//!
//! Categorized solutions for a detected disease, plus the confidence and
//! severity classifications shown next to the top prediction.
//!
//! When the store has no rows for a disease, or the query fails, a built-in
//! table of eight general-purpose categories is shown instead.

use crate::services::PersistenceService;
use cropai_common::models::{Priority, Solution};
use serde::Serialize;
use tracing::{debug, warn};

/// Where the displayed guidance came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidanceSource {
    Store,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Guidance {
    pub disease: String,
    pub source: GuidanceSource,
    pub solutions: Vec<Solution>,
}

impl Guidance {
    /// Category shown when the panel opens
    pub fn initial_category(&self) -> Option<&str> {
        self.solutions.first().map(|s| s.category.as_str())
    }

    pub fn category(&self, category: &str) -> Option<&Solution> {
        self.solutions.iter().find(|s| s.category == category)
    }
}

/// Fetch guidance for a disease, falling back to the built-in table
pub async fn load_guidance(store: &dyn PersistenceService, disease: &str) -> Guidance {
    match store.solutions_for(disease).await {
        Ok(rows) if !rows.is_empty() => {
            debug!("Loaded {} solutions for {}", rows.len(), disease);
            Guidance {
                disease: disease.to_string(),
                source: GuidanceSource::Store,
                solutions: sort_by_priority(rows),
            }
        }
        Ok(_) => {
            debug!("No stored solutions for {}, using defaults", disease);
            fallback_guidance(disease)
        }
        Err(e) => {
            warn!("Failed to load solutions for {}: {}", disease, e);
            fallback_guidance(disease)
        }
    }
}

/// High, medium, low, then anything else; equal priorities keep store order
pub fn sort_by_priority(mut solutions: Vec<Solution>) -> Vec<Solution> {
    solutions.sort_by_key(|s| s.priority.rank());
    solutions
}

fn fallback_guidance(disease: &str) -> Guidance {
    Guidance {
        disease: disease.to_string(),
        source: GuidanceSource::Fallback,
        solutions: default_solutions(disease),
    }
}

struct DefaultCategory {
    category: &'static str,
    title: &'static str,
    description: &'static str,
    priority: Priority,
    items: [&'static str; 5],
}

const DEFAULT_CATEGORIES: [DefaultCategory; 8] = [
    DefaultCategory {
        category: "immediate",
        title: "Immediate Actions",
        description: "Critical steps to take right now",
        priority: Priority::High,
        items: [
            "Isolate affected plants immediately to prevent spread",
            "Remove and destroy severely infected leaves",
            "Stop overhead watering to reduce moisture",
            "Improve air circulation around plants",
            "Apply appropriate fungicide or treatment spray",
        ],
    },
    DefaultCategory {
        category: "treatment",
        title: "Treatment Solutions",
        description: "Proven methods to cure the disease",
        priority: Priority::High,
        items: [
            "Organic neem oil spray (2-3 applications weekly)",
            "Copper-based fungicide for fungal infections",
            "Biological control agents (Trichoderma, Bacillus)",
            "Sulfur-based fungicides for powdery mildew",
            "Remove infected plant parts and sanitize tools",
        ],
    },
    DefaultCategory {
        category: "fertilizer",
        title: "Fertilizer Recommendations",
        description: "Nutrients to strengthen plant immunity",
        priority: Priority::Medium,
        items: [
            "NPK 19-19-19 balanced fertilizer for general health",
            "Potassium-rich fertilizer (0-0-60) to boost immunity",
            "Calcium nitrate for cell wall strengthening",
            "Micronutrient mix (Zinc, Iron, Manganese)",
            "Organic compost tea for beneficial microbes",
        ],
    },
    DefaultCategory {
        category: "soil",
        title: "Soil Management",
        description: "Improve soil health and drainage",
        priority: Priority::Medium,
        items: [
            "Test soil pH (ideal 6.0-7.0) and adjust if needed",
            "Add organic matter (compost, well-rotted manure)",
            "Improve drainage with perlite or sand",
            "Apply beneficial microbes (mycorrhizae)",
            "Rotate crops to break disease cycles",
        ],
    },
    DefaultCategory {
        category: "watering",
        title: "Water Management",
        description: "Proper irrigation practices",
        priority: Priority::Medium,
        items: [
            "Water early morning to allow foliage to dry",
            "Use drip irrigation instead of overhead sprinklers",
            "Avoid waterlogging - ensure proper drainage",
            "Reduce watering frequency in humid conditions",
            "Mulch around plants to maintain moisture",
        ],
    },
    DefaultCategory {
        category: "prevention",
        title: "Long-term Prevention",
        description: "Steps to prevent future outbreaks",
        priority: Priority::Low,
        items: [
            "Plant disease-resistant crop varieties",
            "Maintain proper plant spacing for air flow",
            "Practice crop rotation (3-4 year cycle)",
            "Remove plant debris and weeds regularly",
            "Monitor plants weekly for early detection",
        ],
    },
    DefaultCategory {
        category: "organic",
        title: "Organic Solutions",
        description: "Natural and eco-friendly treatments",
        priority: Priority::Medium,
        items: [
            "Baking soda spray (1 tbsp per gallon water)",
            "Garlic and chili pepper spray as natural pesticide",
            "Milk solution (1:9 ratio) for powdery mildew",
            "Cinnamon powder as natural fungicide",
            "Companion planting with marigolds or basil",
        ],
    },
    DefaultCategory {
        category: "chemical",
        title: "Chemical Treatments",
        description: "Effective chemical solutions when needed",
        priority: Priority::High,
        items: [
            "Mancozeb fungicide for leaf spots and blight",
            "Chlorothalonil for broad-spectrum fungal control",
            "Propiconazole for systemic fungal infections",
            "Streptomycin for bacterial diseases",
            "Always follow label instructions and safety precautions",
        ],
    },
];

/// Built-in guidance in authored order (opens on "immediate")
pub fn default_solutions(disease: &str) -> Vec<Solution> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|c| Solution {
            id: format!("default-{}", c.category),
            disease_name: disease.to_string(),
            category: c.category.to_string(),
            title: c.title.to_string(),
            description: c.description.to_string(),
            items: c.items.iter().map(|i| i.to_string()).collect(),
            priority: c.priority,
        })
        .collect()
}

/// Icon per category; unknown categories get a clipboard
pub fn category_icon(category: &str) -> &'static str {
    match category {
        "immediate" => "🚨",
        "treatment" => "💊",
        "fertilizer" => "🌿",
        "soil" => "🪴",
        "watering" => "💧",
        "prevention" => "🛡️",
        "organic" => "🌱",
        "chemical" => "⚗️",
        _ => "📋",
    }
}

/// Extra notice rendered under specific categories
pub fn category_notice(category: &str) -> Option<&'static str> {
    match category {
        "immediate" => Some("These actions should be taken within 24-48 hours for best results"),
        "chemical" => Some(
            "Always wear protective equipment and follow safety guidelines when using chemicals",
        ),
        _ => None,
    }
}

/// How much to trust the top prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 80.0 {
            ConfidenceLevel::High
        } else if confidence >= 60.0 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConfidenceLevel::High => "High",
            ConfidenceLevel::Medium => "Medium",
            ConfidenceLevel::Low => "Low",
        }
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            ConfidenceLevel::High => {
                "High confidence detection. Consider consulting with an agricultural expert for treatment options."
            }
            ConfidenceLevel::Medium => {
                "Moderate confidence. Additional images or expert consultation recommended for confirmation."
            }
            ConfidenceLevel::Low => {
                "Low confidence. Please capture clearer images or consult an agricultural expert for accurate diagnosis."
            }
        }
    }
}

/// Urgency band of the action plan, derived from confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Moderate,
    Low,
}

impl Severity {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 90.0 {
            Severity::Critical
        } else if confidence >= 75.0 {
            Severity::High
        } else if confidence >= 60.0 {
            Severity::Moderate
        } else {
            Severity::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Moderate => "moderate",
            Severity::Low => "low",
        }
    }
}
