//! Room-clear rewards and the end-of-floor shop

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::player::Player;
use super::scheduler::PermanentBonuses;

/// Number of choices shown by the reward menu and the shop
pub const OFFER_COUNT: usize = 3;

/// Free upgrade picked after every cleared room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardKind {
    ShieldMax,
    MoveSpeed,
    BulletDamage,
}

impl RewardKind {
    pub const ALL: [RewardKind; 3] = [
        RewardKind::ShieldMax,
        RewardKind::MoveSpeed,
        RewardKind::BulletDamage,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RewardKind::ShieldMax => "+20 Shield Max",
            RewardKind::MoveSpeed => "+0.5 Move Speed",
            RewardKind::BulletDamage => "+2 Bullet Damage",
        }
    }

    pub fn apply(&self, player: &mut Player) {
        match self {
            RewardKind::ShieldMax => player.shield_max += 20,
            RewardKind::MoveSpeed => player.speed += 0.5,
            RewardKind::BulletDamage => player.bullet_damage += 2,
        }
    }
}

/// Three distinct rewards in random order
pub fn roll_rewards(rng: &mut impl Rng) -> Vec<RewardKind> {
    let mut pool = RewardKind::ALL.to_vec();
    pool.shuffle(rng);
    pool.truncate(OFFER_COUNT);
    pool
}

/// Items sold in the shop between floors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShopItemKind {
    Heal,
    ShieldMax,
    BulletDamage,
    GrenadeDamage,
    MoveSpeed,
}

impl ShopItemKind {
    pub const ALL: [ShopItemKind; 5] = [
        ShopItemKind::Heal,
        ShopItemKind::ShieldMax,
        ShopItemKind::BulletDamage,
        ShopItemKind::GrenadeDamage,
        ShopItemKind::MoveSpeed,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ShopItemKind::Heal => "+30 HP (Heal)",
            ShopItemKind::ShieldMax => "+20 Shield Max",
            ShopItemKind::BulletDamage => "+5 Bullet Damage",
            ShopItemKind::GrenadeDamage => "+10 Grenade Damage",
            ShopItemKind::MoveSpeed => "+0.5 Move Speed",
        }
    }

    pub fn price(&self) -> u32 {
        match self {
            ShopItemKind::Heal => 20,
            ShopItemKind::ShieldMax => 25,
            ShopItemKind::BulletDamage => 40,
            ShopItemKind::GrenadeDamage => 35,
            ShopItemKind::MoveSpeed => 30,
        }
    }

    /// Grenade damage goes into the permanent bonus ledger; the rest
    /// change the player directly.
    pub fn apply(&self, player: &mut Player, bonuses: &mut PermanentBonuses) {
        match self {
            ShopItemKind::Heal => player.heal(30),
            ShopItemKind::ShieldMax => player.shield_max += 20,
            ShopItemKind::BulletDamage => player.bullet_damage += 5,
            ShopItemKind::GrenadeDamage => bonuses.grenade_damage_bonus += 10,
            ShopItemKind::MoveSpeed => player.speed += 0.5,
        }
    }
}

/// One shop slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopOffer {
    pub item: ShopItemKind,
    pub purchased: bool,
}

/// Why a purchase was refused
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PurchaseError {
    #[error("No shop item in slot {0}")]
    InvalidSlot(usize),
    #[error("{0} already purchased")]
    AlreadyPurchased(&'static str),
    #[error("Insufficient gold: have {have}, need {need}")]
    InsufficientGold { have: u32, need: u32 },
}

/// Three random shop items for this visit
pub fn roll_shop(rng: &mut impl Rng) -> Vec<ShopOffer> {
    let mut pool = ShopItemKind::ALL.to_vec();
    pool.shuffle(rng);
    pool.into_iter()
        .take(OFFER_COUNT)
        .map(|item| ShopOffer {
            item,
            purchased: false,
        })
        .collect()
}

/// Buy the item in `slot`. Gold is only taken when the purchase succeeds.
pub fn purchase(
    offers: &mut [ShopOffer],
    slot: usize,
    player: &mut Player,
    bonuses: &mut PermanentBonuses,
) -> Result<ShopItemKind, PurchaseError> {
    let offer = offers.get_mut(slot).ok_or(PurchaseError::InvalidSlot(slot))?;
    if offer.purchased {
        return Err(PurchaseError::AlreadyPurchased(offer.item.label()));
    }
    let need = offer.item.price();
    if !player.spend_gold(need) {
        return Err(PurchaseError::InsufficientGold {
            have: player.gold,
            need,
        });
    }
    offer.item.apply(player, bonuses);
    offer.purchased = true;
    Ok(offer.item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_rewards_are_distinct() {
        let mut rng = Pcg32::seed_from_u64(3);
        let rewards = roll_rewards(&mut rng);
        assert_eq!(rewards.len(), 3);
        for kind in RewardKind::ALL {
            assert!(rewards.contains(&kind));
        }
    }

    #[test]
    fn test_reward_apply() {
        let mut p = Player::default();
        RewardKind::BulletDamage.apply(&mut p);
        RewardKind::ShieldMax.apply(&mut p);
        assert_eq!(p.bullet_damage, 12);
        assert_eq!(p.shield_max, 80);
    }

    #[test]
    fn test_shop_has_three_distinct_items() {
        let mut rng = Pcg32::seed_from_u64(8);
        let shop = roll_shop(&mut rng);
        assert_eq!(shop.len(), 3);
        assert_ne!(shop[0].item, shop[1].item);
        assert_ne!(shop[1].item, shop[2].item);
        assert_ne!(shop[0].item, shop[2].item);
    }

    #[test]
    fn test_purchase_rules() {
        let mut offers = vec![
            ShopOffer {
                item: ShopItemKind::GrenadeDamage,
                purchased: false,
            },
            ShopOffer {
                item: ShopItemKind::BulletDamage,
                purchased: false,
            },
        ];
        let mut p = Player::default();
        let mut bonuses = PermanentBonuses::default();
        p.add_gold(50);

        assert_eq!(
            purchase(&mut offers, 0, &mut p, &mut bonuses),
            Ok(ShopItemKind::GrenadeDamage)
        );
        assert_eq!(bonuses.grenade_damage_bonus, 10);
        assert_eq!(p.gold, 15);

        assert_eq!(
            purchase(&mut offers, 0, &mut p, &mut bonuses),
            Err(PurchaseError::AlreadyPurchased("+10 Grenade Damage"))
        );
        assert_eq!(
            purchase(&mut offers, 1, &mut p, &mut bonuses),
            Err(PurchaseError::InsufficientGold { have: 15, need: 40 })
        );
        assert_eq!(p.gold, 15);
        assert_eq!(
            purchase(&mut offers, 5, &mut p, &mut bonuses),
            Err(PurchaseError::InvalidSlot(5))
        );
    }

    #[test]
    fn test_heal_respects_max_health() {
        let mut p = Player::default();
        let mut bonuses = PermanentBonuses::default();
        p.health = 90;
        ShopItemKind::Heal.apply(&mut p, &mut bonuses);
        assert_eq!(p.health, 100);
    }
}
