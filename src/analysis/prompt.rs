//! The fixed instructional prompt sent with every analysis request.
//!
//! The prompt asks a conservation expert persona for five sections, in this
//! order: artifact description, observed damage, a severity rating on the
//! [`Severity`] scale with a percentage, proposed restoration steps, and a
//! ready-to-use prompt for a downstream inpainting model.
//!
//! The answer is never parsed. The section headings only nudge the model
//! toward a layout that reads well when displayed verbatim.

use serde::{Deserialize, Serialize};

/// Language the model is asked to answer in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Vi,
    En,
}

/// Ordered damage-severity scale, mildest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Light,
    Moderate,
    Severe,
    VerySevere,
}

impl Severity {
    pub const SCALE: [Severity; 4] = [
        Severity::Light,
        Severity::Moderate,
        Severity::Severe,
        Severity::VerySevere,
    ];

    pub fn label(self, language: Language) -> &'static str {
        match (language, self) {
            (Language::Vi, Severity::Light) => "Nhẹ",
            (Language::Vi, Severity::Moderate) => "Trung bình",
            (Language::Vi, Severity::Severe) => "Nặng",
            (Language::Vi, Severity::VerySevere) => "Rất nặng",
            (Language::En, Severity::Light) => "Light",
            (Language::En, Severity::Moderate) => "Moderate",
            (Language::En, Severity::Severe) => "Severe",
            (Language::En, Severity::VerySevere) => "Very severe",
        }
    }
}

struct Section {
    marker: &'static str,
    heading: &'static str,
    placeholder: &'static str,
}

struct Template {
    persona: &'static str,
    instruction: &'static str,
    description: Section,
    damage: Section,
    severity_heading: &'static str,
    methods: Section,
    inpainting: Section,
}

const VI: Template = Template {
    persona: "Bạn là chuyên gia bảo tồn di sản văn hóa.",
    instruction: "Hãy phân tích bức ảnh hiện vật này và trả lời theo cấu trúc sau (dùng tiếng Việt):",
    description: Section {
        marker: "🔍",
        heading: "MÔ TẢ HIỆN VẬT",
        placeholder: "mô tả ngắn gọn hiện vật",
    },
    damage: Section {
        marker: "⚠️",
        heading: "TÌNH TRẠNG HƯ HẠI",
        placeholder: "liệt kê các hư hại quan sát được",
    },
    severity_heading: "MỨC ĐỘ HƯ HẠI",
    methods: Section {
        marker: "🛠️",
        heading: "PHƯƠNG PHÁP PHỤC HỒI ĐỀ XUẤT",
        placeholder: "các bước phục hồi phù hợp",
    },
    inpainting: Section {
        marker: "📝",
        heading: "PROMPT CHO AI PHỤC HỒI",
        placeholder: "prompt mô tả chi tiết để gửi cho mô hình AI inpainting",
    },
};

const EN: Template = Template {
    persona: "You are a cultural heritage conservation expert.",
    instruction: "Analyze this photo of an artifact and answer using the following structure (in English):",
    description: Section {
        marker: "🔍",
        heading: "ARTIFACT DESCRIPTION",
        placeholder: "a short description of the artifact",
    },
    damage: Section {
        marker: "⚠️",
        heading: "DAMAGE OBSERVED",
        placeholder: "list the damage you can observe",
    },
    severity_heading: "DAMAGE SEVERITY",
    methods: Section {
        marker: "🛠️",
        heading: "PROPOSED RESTORATION METHOD",
        placeholder: "suitable restoration steps",
    },
    inpainting: Section {
        marker: "📝",
        heading: "PROMPT FOR RESTORATION AI",
        placeholder: "a detailed prompt to send to an inpainting model",
    },
};

/// Build the analysis prompt for the given language.
///
/// The same language always yields the same prompt.
pub fn build_prompt(language: Language) -> String {
    let t = match language {
        Language::Vi => &VI,
        Language::En => &EN,
    };
    let scale: Vec<&str> = Severity::SCALE.iter().map(|s| s.label(language)).collect();

    let block = |s: &Section| format!("{} {}:\n[{}]", s.marker, s.heading, s.placeholder);

    format!(
        "{persona} {instruction}\n\n{description}\n\n{damage}\n\n📊 {severity}: [{scale}] – [%]\n\n{methods}\n\n{inpainting}",
        persona = t.persona,
        instruction = t.instruction,
        description = block(&t.description),
        damage = block(&t.damage),
        severity = t.severity_heading,
        scale = scale.join(" / "),
        methods = block(&t.methods),
        inpainting = block(&t.inpainting),
    )
}
