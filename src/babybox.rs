//! The curated "baby box": a fixed list of product suggestions, grouped by
//! category, shown next to a member's liked posts.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxCategory {
    WinterClothes,
    BabysHealth,
    MothersHealth,
    DevelopmentBooks,
    ForParents,
    TravelEssentials,
}

impl BoxCategory {
    pub const ALL: [BoxCategory; 6] = [
        BoxCategory::WinterClothes,
        BoxCategory::BabysHealth,
        BoxCategory::MothersHealth,
        BoxCategory::DevelopmentBooks,
        BoxCategory::ForParents,
        BoxCategory::TravelEssentials,
    ];

    /// The label used both on screen and as the `category` query value.
    pub fn label(self) -> &'static str {
        match self {
            BoxCategory::WinterClothes => "Winter clothes",
            BoxCategory::BabysHealth => "Baby's health",
            BoxCategory::MothersHealth => "Mother's health and comfort",
            BoxCategory::DevelopmentBooks => "Development books",
            BoxCategory::ForParents => "Recommended for parents",
            BoxCategory::TravelEssentials => "Travel essentials",
        }
    }

    pub fn items(self) -> &'static [&'static str] {
        match self {
            BoxCategory::WinterClothes => &["Winter Outfit", "Warm Hat", "Thermal Onesie"],
            BoxCategory::BabysHealth => &[
                "Infrared Forehead Thermometer",
                "Nasal Aspirator",
                "Nail Scissors",
            ],
            BoxCategory::MothersHealth => &["Nursing Pillow", "Cream", "Relaxation Tea"],
            BoxCategory::DevelopmentBooks => &[
                "Baby Development",
                "New Mother Mindset",
                "Parenting Psychology",
            ],
            BoxCategory::ForParents => &[
                "Noise Cancelling Headphones",
                "Decaf coffee",
                "Baby Footprint Kit",
            ],
            BoxCategory::TravelEssentials => &["Diaper Bag", "Travel Bed", "Play mat"],
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CuratedItem {
    pub category: &'static str,
    pub title: &'static str,
}

/// Parse requested labels, dropping unknown ones and repeats. Order is kept.
pub fn selected_categories<'a, I>(requested: I) -> Vec<BoxCategory>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut picked = Vec::new();
    for category in requested.into_iter().filter_map(BoxCategory::from_label) {
        if !picked.contains(&category) {
            picked.push(category);
        }
    }
    picked
}

pub fn curated_items(categories: &[BoxCategory]) -> Vec<CuratedItem> {
    categories
        .iter()
        .flat_map(|c| {
            c.items().iter().map(move |&title| CuratedItem {
                category: c.label(),
                title,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_round_trips_through_its_label() {
        for category in BoxCategory::ALL {
            assert_eq!(BoxCategory::from_label(category.label()), Some(category));
            assert_eq!(category.items().len(), 3);
        }
        assert_eq!(BoxCategory::from_label("Toys"), None);
    }

    #[test]
    fn unknown_and_repeated_categories_are_dropped() {
        let picked = selected_categories([
            "Travel essentials",
            "Toys",
            "Winter clothes",
            "Travel essentials",
        ]);
        assert_eq!(
            picked,
            vec![BoxCategory::TravelEssentials, BoxCategory::WinterClothes]
        );
    }

    #[test]
    fn items_follow_the_requested_order() {
        let items = curated_items(&[BoxCategory::WinterClothes, BoxCategory::BabysHealth]);
        let titles: Vec<_> = items.iter().map(|i| i.title).collect();
        assert_eq!(
            titles,
            vec![
                "Winter Outfit",
                "Warm Hat",
                "Thermal Onesie",
                "Infrared Forehead Thermometer",
                "Nasal Aspirator",
                "Nail Scissors",
            ]
        );
        assert_eq!(items[3].category, "Baby's health");
    }

    #[test]
    fn nothing_requested_means_an_empty_box() {
        assert!(curated_items(&selected_categories(Vec::<&str>::new())).is_empty());
    }
}
