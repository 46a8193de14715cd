use tracing::{info, warn};

use crate::db::Gateway;
use crate::games::{repo, repo_types::NewGame};
use crate::users::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    NoAdmin,
    Seeded { inserted: usize, total: usize },
}

fn text(s: &str) -> Option<String> {
    Some(s.to_string())
}

pub fn sample_games() -> Vec<NewGame> {
    vec![
        NewGame {
            title: "World of Warcraft: Midnight".into(),
            subtitle: text("World of Warcraft®: Midnight"),
            description: text("Previsto para 2026: ¡Precompra hoy mismo!"),
            image_url: text("https://images.unsplash.com/photo-1511512578047-dfb367046420?w=800"),
            category: text("Rol multijugador masivo"),
            color: text("#f39c12"),
            price: Some(179.00),
            original_price: None,
            discount: None,
            badge: text("PREORDER"),
            logo: text("W"),
            is_free: false,
            rating: 4.8,
            downloads: 1_500_000,
        },
        NewGame {
            title: "Diablo IV".into(),
            subtitle: text("Lote de expansión de Diablo® IV"),
            description: text("Experimenta la oscuridad definitiva."),
            image_url: text("https://images.unsplash.com/photo-1542751371-adc38448a05e?w=800"),
            category: text("RPG de acción"),
            color: text("#c0392b"),
            price: Some(211.60),
            original_price: Some(529.00),
            discount: Some(60),
            badge: text("SALE"),
            logo: text("D"),
            is_free: false,
            rating: 4.6,
            downloads: 2_500_000,
        },
        NewGame {
            title: "Overwatch 2".into(),
            subtitle: text("Overwatch® 2"),
            description: text("Únete a la batalla épica."),
            image_url: text("https://images.unsplash.com/photo-1552519507-da3b142c6e3d?w=800"),
            category: text("Acción por equipos"),
            color: text("#e74c3c"),
            price: None,
            original_price: None,
            discount: None,
            badge: text("FREE"),
            logo: text("OW"),
            is_free: true,
            rating: 4.5,
            downloads: 5_000_000,
        },
    ]
}

/// Inserts the sample catalog owned by the first admin. Titles already in
/// the catalog are skipped, so re-running is harmless.
pub async fn seed_sample_data(gw: &Gateway) -> anyhow::Result<SeedOutcome> {
    let Some(admin_id) = User::first_admin_id(gw).await? else {
        warn!("no admin user, sample data not seeded");
        return Ok(SeedOutcome::NoAdmin);
    };

    let games = sample_games();
    let mut inserted = 0;
    for game in &games {
        if repo::insert_if_absent(gw, game, admin_id).await? {
            inserted += 1;
        }
    }
    info!(inserted, total = games.len(), "sample games seeded");
    Ok(SeedOutcome::Seeded {
        inserted,
        total: games.len(),
    })
}
