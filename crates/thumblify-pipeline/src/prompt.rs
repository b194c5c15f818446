use thumblify_types::api::GenerateThumbnailRequest;

/// Build the model prompt from a validated request.
///
/// Sentence order is fixed: style and title, optional color scheme, optional
/// user details, text overlay instruction, then the closing quality sentence
/// carrying the aspect ratio.
pub fn compose_prompt(req: &GenerateThumbnailRequest) -> String {
    let mut prompt = format!(
        "Create a {} thumbnail for: \"{}\". ",
        req.style.prompt_phrase(),
        req.title
    );

    if let Some(scheme) = req.color_scheme {
        prompt.push_str(&format!("Use a {} color scheme. ", scheme.prompt_phrase()));
    }

    if let Some(details) = req.prompt.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        prompt.push_str(&format!("Additional details: {}. ", details));
    }

    if req.text_overlay {
        prompt.push_str(&format!(
            "Include the title \"{}\" as large, legible overlay text. ",
            req.title
        ));
    } else {
        prompt.push_str("Do not include any text in the image. ");
    }

    prompt.push_str(&format!(
        "The thumbnail should be {}, visually stunning, bold, professional, and optimized for maximum click-through rate.",
        req.aspect_ratio
    ));

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use thumblify_types::catalog::{AspectRatio, ColorScheme, ThumbnailStyle};

    fn request() -> GenerateThumbnailRequest {
        GenerateThumbnailRequest {
            title: "10 tips for better sleep".into(),
            prompt: None,
            style: ThumbnailStyle::Minimalist,
            aspect_ratio: AspectRatio::Landscape,
            color_scheme: None,
            text_overlay: false,
        }
    }

    #[test]
    fn minimal_prompt() {
        let prompt = compose_prompt(&request());
        assert_eq!(
            prompt,
            "Create a minimalist thumbnail, clean layout, simple shapes, limited color palette, \
             plenty of negative space, modern flat design, clear focal point thumbnail for: \
             \"10 tips for better sleep\". Do not include any text in the image. The thumbnail \
             should be 16:9, visually stunning, bold, professional, and optimized for maximum \
             click-through rate."
        );
    }

    #[test]
    fn all_sections_in_order() {
        let mut req = request();
        req.style = ThumbnailStyle::TechFuturistic;
        req.color_scheme = Some(ColorScheme::Neon);
        req.prompt = Some("  a robot holding a pillow ".into());
        req.text_overlay = true;
        req.aspect_ratio = AspectRatio::Portrait;

        let prompt = compose_prompt(&req);
        let style = prompt.find("futuristic thumbnail").unwrap();
        let scheme = prompt.find("Use a neon glow effects").unwrap();
        let details = prompt.find("Additional details: a robot holding a pillow. ").unwrap();
        let overlay = prompt.find("as large, legible overlay text").unwrap();
        let closing = prompt.find("The thumbnail should be 9:16").unwrap();
        assert!(style < scheme && scheme < details && details < overlay && overlay < closing);
    }

    #[test]
    fn blank_details_are_skipped() {
        let mut req = request();
        req.prompt = Some("   ".into());
        assert!(!compose_prompt(&req).contains("Additional details"));
    }
}
