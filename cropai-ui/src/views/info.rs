//! Learn More screen: static overview of common crop diseases

struct InfoDisease {
    name: &'static str,
    symptoms: &'static str,
    prevention: &'static str,
}

struct InfoCategory {
    crop: &'static str,
    icon: &'static str,
    diseases: [InfoDisease; 3],
}

const CATEGORIES: [InfoCategory; 4] = [
    InfoCategory {
        crop: "Apple",
        icon: "🍎",
        diseases: [
            InfoDisease { name: "Apple Scab", symptoms: "Dark, scaly lesions on leaves and fruit", prevention: "Remove fallen leaves, use resistant varieties" },
            InfoDisease { name: "Black Rot", symptoms: "Brown circular lesions with purple border", prevention: "Prune infected branches, improve air circulation" },
            InfoDisease { name: "Cedar Apple Rust", symptoms: "Yellow-orange spots on leaves", prevention: "Remove nearby cedar trees, apply fungicides" },
        ],
    },
    InfoCategory {
        crop: "Tomato",
        icon: "🍅",
        diseases: [
            InfoDisease { name: "Early Blight", symptoms: "Dark concentric rings on older leaves", prevention: "Rotate crops, mulch around plants" },
            InfoDisease { name: "Late Blight", symptoms: "Water-soaked spots on leaves and fruit", prevention: "Avoid overhead watering, provide good spacing" },
            InfoDisease { name: "Leaf Mold", symptoms: "Yellow spots on upper leaf surface", prevention: "Improve ventilation, reduce humidity" },
        ],
    },
    InfoCategory {
        crop: "Corn",
        icon: "🌽",
        diseases: [
            InfoDisease { name: "Common Rust", symptoms: "Orange-brown pustules on leaves", prevention: "Plant resistant hybrids, early planting" },
            InfoDisease { name: "Northern Leaf Blight", symptoms: "Long grayish-green lesions", prevention: "Crop rotation, tillage practices" },
            InfoDisease { name: "Cercospora Leaf Spot", symptoms: "Small rectangular spots on leaves", prevention: "Proper plant spacing, balanced fertilization" },
        ],
    },
    InfoCategory {
        crop: "Grape",
        icon: "🍇",
        diseases: [
            InfoDisease { name: "Black Rot", symptoms: "Brown circular lesions on fruit and leaves", prevention: "Prune and destroy infected parts, fungicide application" },
            InfoDisease { name: "Leaf Blight", symptoms: "Angular brown spots on leaves", prevention: "Good air circulation, remove fallen leaves" },
            InfoDisease { name: "Esca (Black Measles)", symptoms: "Tiger stripe pattern on leaves", prevention: "Prune in dry weather, protect pruning wounds" },
        ],
    },
];

pub fn info_screen() -> String {
    let mut categories = String::new();
    for category in CATEGORIES.iter() {
        let diseases: String = category
            .diseases
            .iter()
            .map(|d| {
                format!(
                    r#"<div class="disease-item"><h4>{}</h4><p><span class="muted">Symptoms:</span> {}</p><p><span class="muted">Prevention:</span> {}</p></div>"#,
                    d.name, d.symptoms, d.prevention
                )
            })
            .collect();
        categories.push_str(&format!(
            r#"<div class="card category-card"><h3>{} {}</h3>{}</div>"#,
            category.icon, category.crop, diseases
        ));
    }

    format!(
        r#"<section class="info-section">
    <div class="info-header">
        <h2>Crop Disease Information</h2>
        <form method="post" action="/navigate/analyze"><button class="button secondary" type="submit">Close</button></form>
    </div>
    <p class="muted">Learn about common crop diseases, their symptoms, and prevention methods. Our AI model can detect these and many more diseases across various crops.</p>
    <div class="grid">{categories}</div>
    <div class="grid">
        <div class="card"><h4>How It Works</h4><ol>
            <li>Upload a clear image of the affected crop leaf</li>
            <li>Our AI model analyzes the image using deep learning</li>
            <li>Receive top 3 predictions with confidence scores</li>
            <li>Review recommendations and take appropriate action</li>
        </ol></div>
        <div class="card"><h4>Best Practices</h4><ul>
            <li>Use high-quality, well-lit images</li>
            <li>Focus on the affected leaf area</li>
            <li>Avoid blurry or dark images</li>
            <li>Capture both upper and lower leaf surfaces if possible</li>
        </ul></div>
    </div>
</section>"#,
        categories = categories
    )
}
