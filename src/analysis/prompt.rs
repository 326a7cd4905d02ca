//! Prompts for the prescription-extraction call.
//!
//! The contract with the model is a single flat JSON object whose keys match
//! `RawExtraction` exactly. Patient-facing values are requested in Arabic
//! (the application's UI language); only `medication_name_en` is English,
//! because it keys the openFDA lookup.

pub const EXTRACTION_PROMPT: &str = r#"أنت خبير في تحليل الوصفات الطبية. قم بتحليل الوصفة واستخراج المعلومات التالية:

المعلومات المطلوبة:
1. النص الكامل المقروء من الوصفة
2. اسم الدواء بالعربية والإنجليزية
3. الجرعة
4. عدد مرات الاستخدام
5. تعليمات الاستخدام
6. الآثار الجانبية الشائعة
7. موانع الاستعمال
8. ملاحظات هامة للمريض

Reply with EXACTLY one JSON object using these keys, and nothing else.
Use null for any value that is not present in the prescription.
All values are strings in Arabic, except medication_name_en which is the
English medication name.

{
  "raw_text": "النص الكامل المقروء من الوصفة",
  "medication_name_ar": "الاسم بالعربي",
  "medication_name_en": "English name",
  "dosage": "معلومات الجرعة",
  "frequency": "عدد مرات الاستخدام",
  "instructions": "تعليمات الاستخدام",
  "side_effects": "الآثار الجانبية",
  "contraindications": "موانع الاستعمال",
  "medical_notes": "ملاحظات إضافية"
}"#;

/// Prompt for the image path: instructions only, the image rides alongside
/// as an inline part.
pub fn build_image_prompt() -> String {
    EXTRACTION_PROMPT.to_string()
}

/// Prompt for the pre-extracted-text path: the prescription text is embedded
/// in the prompt body instead of an image part.
pub fn build_text_prompt(extracted_text: &str) -> String {
    format!(
        "{EXTRACTION_PROMPT}\n\nنص الوصفة الطبية:\n<prescription>\n{extracted_text}\n</prescription>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_every_extraction_key() {
        for key in [
            "raw_text",
            "medication_name_ar",
            "medication_name_en",
            "dosage",
            "frequency",
            "instructions",
            "side_effects",
            "contraindications",
            "medical_notes",
        ] {
            assert!(
                EXTRACTION_PROMPT.contains(key),
                "prompt missing key {key}"
            );
        }
    }

    #[test]
    fn text_prompt_embeds_the_text() {
        let prompt = build_text_prompt("Amoxicillin 500mg twice daily");
        assert!(prompt.contains("<prescription>"));
        assert!(prompt.contains("Amoxicillin 500mg twice daily"));
    }
}
