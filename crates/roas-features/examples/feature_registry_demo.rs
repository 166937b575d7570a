//! Demonstration of the ROAS Feature Registry
//!
//! Lists every engineered column by category and shows which ones the
//! per-channel models consume.
//!
//! Run with: cargo run --example feature_registry_demo -p roas-features

use roas_data::Channel;
use roas_features::{
    FeatureCategory, FeatureInfo, available_features, channel_features, features_by_category,
    get_feature_info,
};

fn main() {
    println!("ROAS Feature Registry Demo");
    println!("==========================\n");

    println!("Total features available: {}\n", available_features().len());

    for (category, title) in [
        (FeatureCategory::Raw, "Raw Features"),
        (FeatureCategory::Calendar, "Calendar Features"),
        (FeatureCategory::Engineered, "Engineered Features"),
        (FeatureCategory::Channel, "Channel Features"),
    ] {
        println!("{title}:");
        for feature in features_by_category(category) {
            print_feature(&feature);
        }
        println!();
    }

    for channel in Channel::all() {
        println!(
            "{} model inputs ({}): {}",
            channel.name(),
            channel_features(channel).len(),
            channel_features(channel).join(", ")
        );
    }

    if let Some(info) = get_feature_info("click_impression_ratio") {
        println!("\nLooking up 'click_impression_ratio':");
        print_feature(&info);
    }
}

fn print_feature(info: &FeatureInfo) {
    let marker = if info.model_input { "*" } else { " " };
    println!("  {marker} {:24} {}", info.name, info.description);
}
