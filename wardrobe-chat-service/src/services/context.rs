//! Plain-text wardrobe summary handed to the model as a system message.

use crate::models::{UserProfile, WardrobeItem};
use crate::services::backend::Lookup;

/// Palette colours listed in the profile section.
pub const PALETTE_PREVIEW: usize = 6;

pub const EMPTY_WARDROBE: &str =
    "WARDROBE: No items found. User may need to add clothing items to their wardrobe.";

pub fn build_wardrobe_context(
    items: &Lookup<Vec<WardrobeItem>>,
    profile: &Lookup<UserProfile>,
) -> String {
    let mut context = String::from("User's Wardrobe and Style Profile:\n\n");

    if let Some(profile) = profile.found().filter(|p| !p.is_empty()) {
        write_profile(&mut context, profile);
    }

    match items.found().filter(|items| !items.is_empty()) {
        Some(items) => write_items(&mut context, items),
        None => {
            context.push_str(EMPTY_WARDROBE);
            context.push_str("\n\n");
        }
    }

    context
}

fn write_profile(out: &mut String, profile: &UserProfile) {
    out.push_str("PERSONAL PROFILE:\n");

    let lines = [
        ("Gender", profile.gender.clone()),
        ("Age", profile.age.clone()),
        ("Height", profile.height.clone()),
        ("Color Season", profile.season.clone()),
        ("Undertone", profile.undertone.clone()),
        ("Personal Color Palette", profile.palette_summary(PALETTE_PREVIEW)),
    ];
    for (label, value) in lines {
        if let Some(value) = value {
            out.push_str(&format!("- {}: {}\n", label, value));
        }
    }

    out.push('\n');
}

fn write_items(out: &mut String, items: &[WardrobeItem]) {
    out.push_str(&format!("WARDROBE ITEMS ({} items):\n", items.len()));

    for (index, item) in items.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} by {}\n",
            index + 1,
            item.clothing_type.as_deref().unwrap_or("Item"),
            item.brand.as_deref().unwrap_or("Unknown")
        ));
        out.push_str(&format!("   - Color: {}\n", or_unspecified(&item.color)));
        out.push_str(&format!("   - Size: {}\n", or_unspecified(&item.size)));
        out.push_str(&format!("   - Season: {}\n", or_unspecified(&item.season)));
        if let Some(description) = &item.description {
            out.push_str(&format!("   - Description: {}\n", description));
        }
        out.push('\n');
    }
}

fn or_unspecified(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("Not specified")
}
