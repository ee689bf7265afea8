//! 卡牌、角色、稀有度與戰鬥數據定義
//!
//! # 架構
//!
//! - `CARD_DEFS`: 聲明式卡牌表（聖水、角色）
//! - `CARD_ALIASES`: 唯一的卡名正規化來源，所有子系統查表前都經過 `canonical_card_name`
//! - `CardCandidate`: 一張已擁有、待評估的卡

use serde::{Deserialize, Serialize};

use super::constants::{DEFAULT_UNKNOWN_ELIXIR, HP_PER_ELIXIR_CAP};

// ============================================================================
// 角色
// ============================================================================

/// 卡牌的戰略角色（未分類以 `Option::None` 表示）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "win_conditions")]
    WinCondition,
    #[serde(rename = "buildings")]
    Building,
    #[serde(rename = "spells_big")]
    SpellBig,
    #[serde(rename = "spells_small")]
    SpellSmall,
    #[serde(rename = "support")]
    Support,
    #[serde(rename = "cycle")]
    Cycle,
}

pub const ROLE_COUNT: usize = 6;

impl Role {
    /// 所有角色（順序即組牌時的填位順序）
    pub fn all() -> &'static [Role] {
        &[
            Role::WinCondition,
            Role::Building,
            Role::SpellBig,
            Role::SpellSmall,
            Role::Support,
            Role::Cycle,
        ]
    }

    pub fn to_index(self) -> usize {
        match self {
            Role::WinCondition => 0,
            Role::Building => 1,
            Role::SpellBig => 2,
            Role::SpellSmall => 3,
            Role::Support => 4,
            Role::Cycle => 5,
        }
    }

    /// 序列化鍵值
    pub fn key(self) -> &'static str {
        match self {
            Role::WinCondition => "win_conditions",
            Role::Building => "buildings",
            Role::SpellBig => "spells_big",
            Role::SpellSmall => "spells_small",
            Role::Support => "support",
            Role::Cycle => "cycle",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Role::WinCondition => "Primary tower-damaging threat",
            Role::Building => "Defensive building or siege structure",
            Role::SpellBig => "High-damage spell (4+ elixir)",
            Role::SpellSmall => "Utility spell (2-3 elixir)",
            Role::Support => "Mid-cost support troop",
            Role::Cycle => "Cheap cycle card (1-2 elixir)",
        }
    }

    pub fn is_spell(self) -> bool {
        matches!(self, Role::SpellBig | Role::SpellSmall)
    }
}

// ============================================================================
// 稀有度
// ============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rarity {
    #[default]
    Common,
    Rare,
    Epic,
    Legendary,
    Champion,
}

impl Rarity {
    pub fn all() -> &'static [Rarity] {
        &[
            Rarity::Common,
            Rarity::Rare,
            Rarity::Epic,
            Rarity::Legendary,
            Rarity::Champion,
        ]
    }

    /// 稀有度加成（單卡分數）
    pub fn boost(self) -> f64 {
        match self {
            Rarity::Common => 1.0,
            Rarity::Rare => 1.05,
            Rarity::Epic => 1.10,
            Rarity::Legendary => 1.15,
            Rarity::Champion => 1.20,
        }
    }

    /// 解析稀有度名稱；未知名稱回傳 None，呼叫端以 Common (1.0) 處理
    pub fn parse(input: &str) -> Option<Rarity> {
        match input.trim().to_ascii_lowercase().as_str() {
            "common" => Some(Rarity::Common),
            "rare" => Some(Rarity::Rare),
            "epic" => Some(Rarity::Epic),
            "legendary" => Some(Rarity::Legendary),
            "champion" => Some(Rarity::Champion),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Rare => "Rare",
            Rarity::Epic => "Epic",
            Rarity::Legendary => "Legendary",
            Rarity::Champion => "Champion",
        }
    }
}

// ============================================================================
// 戰鬥數據
// ============================================================================

/// 攻擊目標類型
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Targets {
    Air,
    Ground,
    #[serde(rename = "Air & Ground")]
    AirAndGround,
    Buildings,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Targets {
    pub fn parse(input: &str) -> Targets {
        match input.trim() {
            "Air" => Targets::Air,
            "Ground" => Targets::Ground,
            "Air & Ground" => Targets::AirAndGround,
            "Buildings" => Targets::Buildings,
            _ => Targets::Unknown,
        }
    }

    pub fn hits_air(self) -> bool {
        matches!(self, Targets::Air | Targets::AirAndGround)
    }

    /// 目標覆蓋度：全目標 1.0，單一空/地 0.7，其餘 0.5
    pub fn coverage(self) -> f64 {
        match self {
            Targets::AirAndGround => 1.0,
            Targets::Air | Targets::Ground => 0.7,
            _ => 0.5,
        }
    }
}

/// 單卡戰鬥數據
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CombatStats {
    pub hitpoints: f64,
    pub damage: f64,
    pub damage_per_second: f64,
    pub range: f64,
    pub targets: Targets,
    pub radius: f64,
    pub lifetime: f64,
}

impl CombatStats {
    pub fn dps_per_elixir(&self, elixir: u32) -> f64 {
        if elixir == 0 {
            return 0.0;
        }
        self.damage_per_second / elixir as f64
    }

    pub fn hp_per_elixir(&self, elixir: u32) -> f64 {
        if elixir == 0 {
            return 0.0;
        }
        self.hitpoints / elixir as f64
    }

    /// 角色相關效能，回傳 [0, 1]；未分類卡牌固定 0.5
    pub fn role_effectiveness(&self, role: Option<Role>) -> f64 {
        let half = |value: f64, cap: f64| (value / cap).min(1.0) * 0.5;
        match role {
            None => 0.5,
            Some(Role::WinCondition) => half(self.hitpoints, 3000.0) + half(self.damage, 500.0),
            Some(Role::Building) => half(self.hitpoints, 2000.0) + half(self.lifetime, 60.0),
            Some(Role::SpellBig) | Some(Role::SpellSmall) => {
                half(self.damage, 600.0) + half(self.radius, 5.0)
            }
            Some(Role::Support) | Some(Role::Cycle) => {
                let targets = if self.targets == Targets::AirAndGround { 0.5 } else { 0.25 };
                half(self.range, 7.0) + targets
            }
        }
    }

    pub fn is_splash(&self) -> bool {
        self.radius > 0.0
    }

    /// 坦克承受力（HP/聖水 正規化）
    pub fn durability(&self, elixir: u32) -> f64 {
        (self.hp_per_elixir(elixir) / HP_PER_ELIXIR_CAP).min(1.0)
    }
}

// ============================================================================
// 卡牌定義表
// ============================================================================

/// 卡牌靜態定義
#[derive(Clone, Copy)]
pub struct CardDef {
    pub name: &'static str,
    pub elixir: u32,
    pub role: Role,
}

const fn def(name: &'static str, elixir: u32, role: Role) -> CardDef {
    CardDef { name, elixir, role }
}

/// 卡牌定義表（未收錄的卡以聖水推斷角色）
pub static CARD_DEFS: &[CardDef] = &[
    // 勝利條件
    def("Royal Giant", 6, Role::WinCondition),
    def("Hog Rider", 4, Role::WinCondition),
    def("Giant", 5, Role::WinCondition),
    def("P.E.K.K.A", 7, Role::WinCondition),
    def("Giant Skeleton", 6, Role::WinCondition),
    def("Goblin Barrel", 3, Role::WinCondition),
    def("Mortar", 4, Role::WinCondition),
    def("X-Bow", 6, Role::WinCondition),
    def("Royal Hogs", 5, Role::WinCondition),
    def("Golem", 8, Role::WinCondition),
    def("Lava Hound", 7, Role::WinCondition),
    def("Balloon", 5, Role::WinCondition),
    def("Miner", 3, Role::WinCondition),
    def("Graveyard", 5, Role::WinCondition),
    def("Battle Ram", 4, Role::WinCondition),
    def("Ram Rider", 5, Role::WinCondition),
    def("Goblin Giant", 6, Role::WinCondition),
    def("Electro Giant", 7, Role::WinCondition),
    def("Wall Breakers", 2, Role::WinCondition),
    def("Three Musketeers", 9, Role::WinCondition),
    def("Sparky", 6, Role::WinCondition),
    def("Elixir Golem", 3, Role::WinCondition),
    def("Goblin Drill", 4, Role::WinCondition),
    def("Skeleton Barrel", 3, Role::WinCondition),
    // 建築
    def("Cannon", 3, Role::Building),
    def("Goblin Cage", 4, Role::Building),
    def("Inferno Tower", 5, Role::Building),
    def("Bomb Tower", 4, Role::Building),
    def("Tombstone", 3, Role::Building),
    def("Goblin Hut", 5, Role::Building),
    def("Barbarian Hut", 6, Role::Building),
    def("Tesla", 4, Role::Building),
    def("Furnace", 4, Role::Building),
    def("Elixir Collector", 6, Role::Building),
    // 大型法術
    def("Fireball", 4, Role::SpellBig),
    def("Poison", 4, Role::SpellBig),
    def("Lightning", 6, Role::SpellBig),
    def("Rocket", 6, Role::SpellBig),
    def("Earthquake", 3, Role::SpellBig),
    // 小型法術
    def("Zap", 2, Role::SpellSmall),
    def("Arrows", 3, Role::SpellSmall),
    def("Giant Snowball", 2, Role::SpellSmall),
    def("Barbarian Barrel", 2, Role::SpellSmall),
    def("Freeze", 4, Role::SpellSmall),
    def("Log", 2, Role::SpellSmall),
    def("Tornado", 3, Role::SpellSmall),
    def("Royal Delivery", 3, Role::SpellSmall),
    def("Rage", 2, Role::SpellSmall),
    // 支援
    def("Archers", 3, Role::Support),
    def("Bomber", 2, Role::Support),
    def("Musketeer", 4, Role::Support),
    def("Wizard", 5, Role::Support),
    def("Mega Minion", 3, Role::Support),
    def("Valkyrie", 4, Role::Support),
    def("Baby Dragon", 4, Role::Support),
    def("Skeleton Dragons", 4, Role::Support),
    def("Witch", 5, Role::Support),
    def("Night Witch", 4, Role::Support),
    def("Electro Wizard", 4, Role::Support),
    def("Ice Wizard", 3, Role::Support),
    def("Inferno Dragon", 4, Role::Support),
    def("Princess", 3, Role::Support),
    def("Dart Goblin", 3, Role::Support),
    def("Magic Archer", 4, Role::Support),
    def("Executioner", 5, Role::Support),
    def("Hunter", 4, Role::Support),
    def("Bowler", 5, Role::Support),
    def("Firecracker", 3, Role::Support),
    def("Mini P.E.K.K.A", 4, Role::Support),
    def("Lumberjack", 4, Role::Support),
    def("Dark Prince", 4, Role::Support),
    def("Prince", 5, Role::Support),
    def("Mega Knight", 7, Role::Support),
    def("Bandit", 3, Role::Support),
    def("Royal Ghost", 3, Role::Support),
    def("Electro Dragon", 5, Role::Support),
    def("Flying Machine", 4, Role::Support),
    def("Barbarians", 5, Role::Support),
    def("Elite Barbarians", 6, Role::Support),
    def("Fisherman", 3, Role::Support),
    def("Mother Witch", 4, Role::Support),
    // 循環
    def("Knight", 3, Role::Cycle),
    def("Skeletons", 1, Role::Cycle),
    def("Ice Spirit", 1, Role::Cycle),
    def("Electro Spirit", 1, Role::Cycle),
    def("Fire Spirit", 1, Role::Cycle),
    def("Heal Spirit", 1, Role::Cycle),
    def("Bats", 2, Role::Cycle),
    def("Spear Goblins", 2, Role::Cycle),
    def("Goblins", 2, Role::Cycle),
    def("Goblin Gang", 3, Role::Cycle),
    def("Minions", 3, Role::Cycle),
    def("Ice Golem", 2, Role::Cycle),
    def("Skeleton Army", 3, Role::Cycle),
    def("Guards", 3, Role::Cycle),
];

/// 卡名別名 → 正規名稱（別名比對不分大小寫）
pub static CARD_ALIASES: &[(&str, &str)] = &[
    ("the log", "Log"),
    ("log", "Log"),
    ("pekka", "P.E.K.K.A"),
    ("p.e.k.k.a.", "P.E.K.K.A"),
    ("mini pekka", "Mini P.E.K.K.A"),
    ("mini p.e.k.k.a.", "Mini P.E.K.K.A"),
    ("xbow", "X-Bow"),
    ("x bow", "X-Bow"),
    ("ewiz", "Electro Wizard"),
    ("e-wiz", "Electro Wizard"),
    ("hog", "Hog Rider"),
    ("lava", "Lava Hound"),
    ("skarmy", "Skeleton Army"),
    ("barb barrel", "Barbarian Barrel"),
    ("snowball", "Giant Snowball"),
    ("edrag", "Electro Dragon"),
    ("e-giant", "Electro Giant"),
];

/// 卡名正規化：去除空白並解析已知別名，其餘名稱原樣保留（大小寫敏感）
pub fn canonical_card_name(input: &str) -> &str {
    let trimmed = input.trim();
    CARD_ALIASES
        .iter()
        .find(|(alias, _)| trimmed.eq_ignore_ascii_case(alias))
        .map(|&(_, canonical)| canonical)
        .unwrap_or(trimmed)
}

pub fn card_def(name: &str) -> Option<&'static CardDef> {
    let name = canonical_card_name(name);
    CARD_DEFS.iter().find(|d| d.name == name)
}

/// 查詢卡牌聖水：優先使用呼叫端提供的值，否則查表，未知卡牌為 4
pub fn card_elixir(name: &str, provided: Option<u32>) -> u32 {
    match provided {
        Some(elixir) if elixir > 0 => elixir,
        _ => card_def(name).map(|d| d.elixir).unwrap_or(DEFAULT_UNKNOWN_ELIXIR),
    }
}

/// 判定卡牌角色：查表優先，未收錄時依聖水推斷；聖水為 0 視為未分類
pub fn classify_card(name: &str, elixir: u32) -> Option<Role> {
    if let Some(d) = card_def(name) {
        return Some(d.role);
    }
    match elixir {
        0 => None,
        1..=2 => Some(Role::Cycle),
        3..=5 => Some(Role::Support),
        _ => Some(Role::WinCondition),
    }
}

// ============================================================================
// 候選卡
// ============================================================================

/// 一張已擁有、待評估的卡
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardCandidate {
    pub name: String,
    pub level: u32,
    pub max_level: u32,
    pub rarity: Rarity,
    pub elixir: u32,
    pub role: Option<Role>,
    /// 建池時寫入一次的情境分數
    pub score: f64,
    pub evolution_level: u32,
    pub max_evolution_level: u32,
    pub stats: Option<CombatStats>,
}

impl CardCandidate {
    pub fn new(name: &str, level: u32, max_level: u32, rarity: Rarity, elixir: u32, role: Option<Role>) -> Self {
        Self {
            name: canonical_card_name(name).to_string(),
            level,
            max_level,
            rarity,
            elixir,
            role,
            score: 0.0,
            evolution_level: 0,
            max_evolution_level: 0,
            stats: None,
        }
    }

    pub fn with_evolution(mut self, evolution_level: u32, max_evolution_level: u32) -> Self {
        self.evolution_level = evolution_level;
        self.max_evolution_level = max_evolution_level;
        self
    }

    pub fn with_stats(mut self, stats: CombatStats) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }

    /// 等級比例（含進化進度）
    pub fn level_ratio(&self) -> f64 {
        if self.max_level == 0 {
            return 0.0;
        }
        let card_ratio = self.level as f64 / self.max_level as f64;
        if self.max_evolution_level == 0 {
            return card_ratio;
        }
        let evo_ratio = self.evolution_level as f64 / self.max_evolution_level as f64;
        card_ratio * 0.7 + evo_ratio * 0.3
    }

    pub fn evolution_ratio(&self) -> f64 {
        if self.max_evolution_level == 0 {
            return 0.0;
        }
        (self.evolution_level as f64 / self.max_evolution_level as f64).min(1.0)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == Some(role)
    }

    pub fn is_win_condition(&self) -> bool {
        self.has_role(Role::WinCondition)
    }

    pub fn is_spell(&self) -> bool {
        self.role.map(Role::is_spell).unwrap_or(false)
    }

    pub fn is_air_defense(&self) -> bool {
        self.stats.map(|s| s.targets.hits_air()).unwrap_or(false)
    }

    pub fn can_evolve(&self) -> bool {
        self.max_evolution_level > 0
    }
}

/// 各角色張數（依 `Role::to_index` 排列）
pub fn count_roles(cards: &[CardCandidate]) -> [usize; ROLE_COUNT] {
    let mut counts = [0; ROLE_COUNT];
    for role in cards.iter().filter_map(|c| c.role) {
        counts[role.to_index()] += 1;
    }
    counts
}

/// 平衡牌組：至少 1 勝利條件、恰好 1 小法術、至少 2 法術、至少 1 循環卡
pub fn has_balanced_roles(cards: &[CardCandidate]) -> bool {
    let counts = count_roles(cards);
    let spells = counts[Role::SpellBig.to_index()] + counts[Role::SpellSmall.to_index()];
    counts[Role::WinCondition.to_index()] >= 1
        && counts[Role::SpellSmall.to_index()] == 1
        && spells >= 2
        && counts[Role::Cycle.to_index()] >= 1
}

// ============================================================================
// 單元測試
// ============================================================================
