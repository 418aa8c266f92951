use services::LessonCatalog;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdminTab {
    Lessons,
    Units,
    Analytics,
    Settings,
}

impl AdminTab {
    pub const ALL: [AdminTab; 4] = [
        AdminTab::Lessons,
        AdminTab::Units,
        AdminTab::Analytics,
        AdminTab::Settings,
    ];

    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tab| tab.slug() == slug)
    }

    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            AdminTab::Lessons => "lessons",
            AdminTab::Units => "units",
            AdminTab::Analytics => "analytics",
            AdminTab::Settings => "settings",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            AdminTab::Lessons => "Lessons",
            AdminTab::Units => "Units",
            AdminTab::Analytics => "Analytics",
            AdminTab::Settings => "Settings",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminLessonRow {
    pub id: u64,
    pub title: String,
    pub unit: String,
    pub category: &'static str,
    pub access: &'static str,
    pub status: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminUnitRow {
    pub id: u64,
    pub title: String,
    pub lessons: usize,
    pub premium: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CatalogStats {
    pub units: usize,
    pub lessons: usize,
    pub premium: usize,
    pub published: usize,
}

/// Read-only catalog tables for the admin panel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminVm {
    pub lessons: Vec<AdminLessonRow>,
    pub units: Vec<AdminUnitRow>,
    pub stats: CatalogStats,
}

#[must_use]
pub fn map_admin(catalog: &LessonCatalog) -> AdminVm {
    let mut lessons = Vec::new();
    let mut units = Vec::new();
    let mut stats = CatalogStats {
        units: catalog.units().len(),
        ..CatalogStats::default()
    };

    for unit in catalog.units() {
        let mut premium = 0;
        for summary in &unit.lessons {
            let published = catalog.is_playable(summary.id);
            if summary.premium {
                premium += 1;
            }
            if published {
                stats.published += 1;
            }
            lessons.push(AdminLessonRow {
                id: summary.id.value(),
                title: summary.title.clone(),
                unit: format!("Unit {}", unit.id.value()),
                category: summary.category.label(),
                access: if summary.premium { "premium" } else { "free" },
                status: if published { "published" } else { "draft" },
            });
        }
        stats.premium += premium;
        units.push(AdminUnitRow {
            id: unit.id.value(),
            title: unit.title.clone(),
            lessons: unit.lessons.len(),
            premium,
        });
    }
    stats.lessons = lessons.len();

    AdminVm {
        lessons,
        units,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tabs_round_trip_through_slugs() {
        for tab in AdminTab::ALL {
            assert_eq!(AdminTab::from_slug(tab.slug()), Some(tab));
        }
        assert_eq!(AdminTab::from_slug("users"), None);
    }

    #[test]
    fn builtin_catalog_counts() {
        let catalog = LessonCatalog::builtin().unwrap();
        let vm = map_admin(&catalog);
        assert_eq!(vm.stats.units, 4);
        assert_eq!(vm.stats.lessons, 23);
        assert_eq!(vm.stats.premium, 7);
        assert_eq!(vm.stats.published, 13);
        assert_eq!(vm.units[0].lessons, 8);
        assert_eq!(vm.lessons[1].status, "published");
        assert_eq!(vm.lessons[22].status, "draft");
    }
}
