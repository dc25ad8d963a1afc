use std::path::Path;

use chrono::{DateTime, Local, NaiveDate, Utc};
use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::error::{Result, SproutError};
use crate::models::{
    ActivityKind, ActivityRecord, BabyProfile, Food, FoodStatus, IntroducedFood, NewBabyProfile,
    NewFood, NewRecipe, NewTip, Owner, ProgressSnapshot, Recipe, RecipeStatus, Tip, ToggleOutcome,
    UserProgress,
};

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS owners (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL UNIQUE,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS baby_profiles (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL,
                    owner_id INTEGER NOT NULL UNIQUE REFERENCES owners(id),
                    name TEXT NOT NULL,
                    birth_date TEXT NOT NULL,
                    weight_kg REAL,
                    feeding_type TEXT,
                    allergies TEXT NOT NULL DEFAULT '[]',
                    medical_conditions TEXT NOT NULL DEFAULT '[]',
                    dietary_restrictions TEXT NOT NULL DEFAULT '[]',
                    feeding_goals TEXT NOT NULL DEFAULT '[]',
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS foods (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL,
                    name TEXT NOT NULL UNIQUE,
                    food_type TEXT,
                    age_suggestion TEXT,
                    allergen_info TEXT,
                    choking_hazard_info TEXT,
                    iron_rich INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS recipes (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL,
                    title TEXT NOT NULL UNIQUE,
                    description TEXT,
                    ingredients TEXT NOT NULL DEFAULT '[]',
                    method TEXT NOT NULL DEFAULT '[]',
                    servings INTEGER,
                    time TEXT,
                    link TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS introduced_foods (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL,
                    owner_id INTEGER NOT NULL REFERENCES owners(id),
                    profile_id INTEGER NOT NULL REFERENCES baby_profiles(id),
                    food_id INTEGER NOT NULL REFERENCES foods(id),
                    introduced_date TEXT NOT NULL,
                    notes TEXT,
                    created_at TEXT NOT NULL,
                    UNIQUE(owner_id, food_id)
                );

                CREATE TABLE IF NOT EXISTS recipe_favorites (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL,
                    owner_id INTEGER NOT NULL REFERENCES owners(id),
                    recipe_id INTEGER NOT NULL REFERENCES recipes(id),
                    created_at TEXT NOT NULL,
                    UNIQUE(owner_id, recipe_id)
                );

                CREATE TABLE IF NOT EXISTS user_progress (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL,
                    owner_id INTEGER NOT NULL UNIQUE REFERENCES owners(id),
                    total_points INTEGER NOT NULL DEFAULT 0,
                    current_streak INTEGER NOT NULL DEFAULT 0,
                    longest_streak INTEGER NOT NULL DEFAULT 0,
                    last_activity_date TEXT,
                    level_progress INTEGER NOT NULL DEFAULT 0,
                    feeding_level TEXT NOT NULL,
                    achievements TEXT NOT NULL DEFAULT '[]',
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS user_activities (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    owner_id INTEGER NOT NULL REFERENCES owners(id),
                    timestamp TEXT NOT NULL,
                    kind TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS tips (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    title TEXT NOT NULL UNIQUE,
                    description TEXT NOT NULL,
                    age_range TEXT
                );

                CREATE INDEX IF NOT EXISTS idx_foods_name ON foods(name);
                CREATE INDEX IF NOT EXISTS idx_recipes_title ON recipes(title);
                CREATE INDEX IF NOT EXISTS idx_introduced_owner ON introduced_foods(owner_id);
                CREATE INDEX IF NOT EXISTS idx_activities_owner_ts ON user_activities(owner_id, timestamp);

                PRAGMA user_version = 1;",
            )?;
        }

        if version < 2 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS recipe_interactions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL,
                    owner_id INTEGER NOT NULL REFERENCES owners(id),
                    recipe_id INTEGER NOT NULL REFERENCES recipes(id),
                    tried INTEGER NOT NULL DEFAULT 0,
                    updated_at TEXT NOT NULL,
                    UNIQUE(owner_id, recipe_id)
                );

                PRAGMA user_version = 2;",
            )?;
        }

        Ok(())
    }

    // --- Row mapping helpers ---

    fn json_list(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Vec<String>> {
        let raw: String = row.get(idx)?;
        serde_json::from_str(&raw).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
    }

    fn date_col(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDate> {
        let raw: String = row.get(idx)?;
        NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
    }

    fn opt_date_col(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
        let raw: Option<String> = row.get(idx)?;
        match raw {
            None => Ok(None),
            Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d").map(Some).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    idx,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            }),
        }
    }

    fn timestamp_col(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
        let raw: String = row.get(idx)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    idx,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })
    }

    fn owner_from_row(row: &rusqlite::Row) -> rusqlite::Result<Owner> {
        Ok(Owner {
            id: row.get(0)?,
            name: row.get(1)?,
            created_at: row.get(2)?,
        })
    }

    fn profile_from_row(row: &rusqlite::Row) -> rusqlite::Result<BabyProfile> {
        Ok(BabyProfile {
            id: row.get(0)?,
            uuid: row.get(1)?,
            owner_id: row.get(2)?,
            name: row.get(3)?,
            birth_date: Self::date_col(row, 4)?,
            weight_kg: row.get(5)?,
            feeding_type: row.get(6)?,
            allergies: Self::json_list(row, 7)?,
            medical_conditions: Self::json_list(row, 8)?,
            dietary_restrictions: Self::json_list(row, 9)?,
            feeding_goals: Self::json_list(row, 10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }

    fn food_from_row(row: &rusqlite::Row) -> rusqlite::Result<Food> {
        Ok(Food {
            id: row.get(0)?,
            uuid: row.get(1)?,
            name: row.get(2)?,
            food_type: row.get(3)?,
            age_suggestion: row.get(4)?,
            allergen_info: row.get(5)?,
            choking_hazard_info: row.get(6)?,
            iron_rich: row.get::<_, i64>(7)? != 0,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    fn recipe_from_row(row: &rusqlite::Row) -> rusqlite::Result<Recipe> {
        Ok(Recipe {
            id: row.get(0)?,
            uuid: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            ingredients: Self::json_list(row, 4)?,
            method: Self::json_list(row, 5)?,
            servings: row.get(6)?,
            time: row.get(7)?,
            link: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    fn progress_from_row(row: &rusqlite::Row) -> rusqlite::Result<UserProgress> {
        Ok(UserProgress {
            id: row.get(0)?,
            uuid: row.get(1)?,
            owner_id: row.get(2)?,
            total_points: row.get(3)?,
            current_streak: row.get(4)?,
            longest_streak: row.get(5)?,
            last_activity_date: Self::opt_date_col(row, 6)?,
            level_progress: row.get(7)?,
            feeding_level: row.get(8)?,
            achievements: Self::json_list(row, 9)?,
            updated_at: row.get(10)?,
        })
    }

    // --- Owners ---

    pub fn get_or_create_owner(&self, name: &str) -> Result<Owner> {
        if let Some(owner) = self.get_owner(name)? {
            return Ok(owner);
        }
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO owners (name, created_at) VALUES (?1, ?2)
             ON CONFLICT(name) DO NOTHING",
            params![name, now],
        )?;
        self.get_owner(name)?
            .ok_or_else(|| SproutError::not_found("owner", name))
    }

    pub fn get_owner(&self, name: &str) -> Result<Option<Owner>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, created_at FROM owners WHERE name = ?1")?;
        let mut rows = stmt.query(params![name])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::owner_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    // --- Baby profiles ---

    pub fn upsert_profile(&self, owner_id: i64, profile: &NewBabyProfile) -> Result<BabyProfile> {
        let now = Local::now().to_rfc3339();
        let uuid = Uuid::new_v4().to_string();
        let birth_date = profile.birth_date.format("%Y-%m-%d").to_string();
        self.conn.execute(
            "INSERT INTO baby_profiles (uuid, owner_id, name, birth_date, weight_kg, feeding_type,
                                        allergies, medical_conditions, dietary_restrictions,
                                        feeding_goals, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
             ON CONFLICT(owner_id) DO UPDATE SET
                 name = excluded.name,
                 birth_date = excluded.birth_date,
                 weight_kg = excluded.weight_kg,
                 feeding_type = excluded.feeding_type,
                 allergies = excluded.allergies,
                 medical_conditions = excluded.medical_conditions,
                 dietary_restrictions = excluded.dietary_restrictions,
                 feeding_goals = excluded.feeding_goals,
                 updated_at = excluded.updated_at",
            params![
                uuid,
                owner_id,
                profile.name,
                birth_date,
                profile.weight_kg,
                profile.feeding_type,
                serde_json::to_string(&profile.allergies)?,
                serde_json::to_string(&profile.medical_conditions)?,
                serde_json::to_string(&profile.dietary_restrictions)?,
                serde_json::to_string(&profile.feeding_goals)?,
                now,
            ],
        )?;
        self.get_profile(owner_id)?
            .ok_or_else(|| SproutError::not_found("profile", owner_id.to_string()))
    }

    pub fn get_profile(&self, owner_id: i64) -> Result<Option<BabyProfile>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, uuid, owner_id, name, birth_date, weight_kg, feeding_type,
                    allergies, medical_conditions, dietary_restrictions, feeding_goals,
                    created_at, updated_at
             FROM baby_profiles WHERE owner_id = ?1",
        )?;
        let mut rows = stmt.query(params![owner_id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::profile_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    // --- Food catalog ---

    pub fn upsert_food(&self, food: &NewFood) -> Result<Food> {
        let now = Local::now().to_rfc3339();
        let uuid = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO foods (uuid, name, food_type, age_suggestion, allergen_info,
                                choking_hazard_info, iron_rich, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
             ON CONFLICT(name) DO UPDATE SET
                 food_type = excluded.food_type,
                 age_suggestion = excluded.age_suggestion,
                 allergen_info = excluded.allergen_info,
                 choking_hazard_info = excluded.choking_hazard_info,
                 iron_rich = excluded.iron_rich,
                 updated_at = excluded.updated_at",
            params![
                uuid,
                food.name,
                food.food_type,
                food.age_suggestion,
                food.allergen_info,
                food.choking_hazard_info,
                i64::from(food.iron_rich),
                now,
            ],
        )?;
        self.get_food_by_name(&food.name)?
            .ok_or_else(|| SproutError::not_found("food", &food.name))
    }

    pub fn get_food_by_name(&self, name: &str) -> Result<Option<Food>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, uuid, name, food_type, age_suggestion, allergen_info,
                    choking_hazard_info, iron_rich, created_at, updated_at
             FROM foods WHERE name = ?1 COLLATE NOCASE",
        )?;
        let mut rows = stmt.query(params![name])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::food_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn count_foods(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM foods", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Name-sorted catalog listing joined with the owner's introduction rows.
    pub fn list_foods(
        &self,
        owner_id: i64,
        search: Option<&str>,
        category: Option<&str>,
        introduced_only: bool,
    ) -> Result<Vec<FoodStatus>> {
        let pattern = search.map(|q| {
            let escaped = q
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            format!("%{escaped}%")
        });
        let mut stmt = self.conn.prepare(
            "SELECT f.id, f.uuid, f.name, f.food_type, f.age_suggestion, f.allergen_info,
                    f.choking_hazard_info, f.iron_rich, f.created_at, f.updated_at,
                    i.introduced_date, i.notes
             FROM foods f
             LEFT JOIN introduced_foods i ON i.food_id = f.id AND i.owner_id = ?1
             WHERE (?2 IS NULL OR f.name LIKE ?2 ESCAPE '\\')
               AND (?3 IS NULL OR f.food_type = ?3)
               AND (?4 = 0 OR i.id IS NOT NULL)
             ORDER BY f.name",
        )?;
        let foods = stmt
            .query_map(
                params![owner_id, pattern, category, i64::from(introduced_only)],
                |row| {
                    let food = Self::food_from_row(row)?;
                    let introduced_date = Self::opt_date_col(row, 10)?;
                    Ok(FoodStatus {
                        introduced: introduced_date.is_some(),
                        introduced_date,
                        introduction_notes: row.get(11)?,
                        food,
                    })
                },
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(foods)
    }

    // --- Recipe catalog ---

    pub fn upsert_recipe(&self, recipe: &NewRecipe) -> Result<Recipe> {
        let now = Local::now().to_rfc3339();
        let uuid = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO recipes (uuid, title, description, ingredients, method, servings,
                                  time, link, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
             ON CONFLICT(title) DO UPDATE SET
                 description = excluded.description,
                 ingredients = excluded.ingredients,
                 method = excluded.method,
                 servings = excluded.servings,
                 time = excluded.time,
                 link = excluded.link,
                 updated_at = excluded.updated_at",
            params![
                uuid,
                recipe.title,
                recipe.description,
                serde_json::to_string(&recipe.ingredients)?,
                serde_json::to_string(&recipe.method)?,
                recipe.servings,
                recipe.time,
                recipe.link,
                now,
            ],
        )?;
        self.get_recipe_by_title(&recipe.title)?
            .ok_or_else(|| SproutError::not_found("recipe", &recipe.title))
    }

    pub fn get_recipe_by_title(&self, title: &str) -> Result<Option<Recipe>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, uuid, title, description, ingredients, method, servings, time, link,
                    created_at, updated_at
             FROM recipes WHERE title = ?1 COLLATE NOCASE",
        )?;
        let mut rows = stmt.query(params![title])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::recipe_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn count_recipes(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM recipes", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Title-sorted catalog listing joined with the owner's favorite/tried rows.
    pub fn list_recipes(
        &self,
        owner_id: i64,
        search: Option<&str>,
        favorites_only: bool,
    ) -> Result<Vec<RecipeStatus>> {
        let pattern = search.map(|q| {
            let escaped = q
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            format!("%{escaped}%")
        });
        let mut stmt = self.conn.prepare(
            "SELECT r.id, r.uuid, r.title, r.description, r.ingredients, r.method, r.servings,
                    r.time, r.link, r.created_at, r.updated_at,
                    fav.id, ri.tried
             FROM recipes r
             LEFT JOIN recipe_favorites fav ON fav.recipe_id = r.id AND fav.owner_id = ?1
             LEFT JOIN recipe_interactions ri ON ri.recipe_id = r.id AND ri.owner_id = ?1
             WHERE (?2 IS NULL OR r.title LIKE ?2 ESCAPE '\\' OR r.description LIKE ?2 ESCAPE '\\')
               AND (?3 = 0 OR fav.id IS NOT NULL)
             ORDER BY r.title",
        )?;
        let recipes = stmt
            .query_map(
                params![owner_id, pattern, i64::from(favorites_only)],
                |row| {
                    let recipe = Self::recipe_from_row(row)?;
                    let fav_id: Option<i64> = row.get(11)?;
                    let tried: Option<i64> = row.get(12)?;
                    Ok(RecipeStatus {
                        recipe,
                        favorite: fav_id.is_some(),
                        tried: tried.unwrap_or(0) != 0,
                    })
                },
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(recipes)
    }

    // --- Relation toggles ---
    //
    // Delete-if-present, otherwise insert. The insert arm uses the
    // UNIQUE(owner_id, <subject>) index with ON CONFLICT DO NOTHING, so a
    // raced duplicate insert fails closed instead of duplicating the row.

    pub fn toggle_introduced_food(
        &self,
        owner_id: i64,
        profile_id: i64,
        food_id: i64,
        introduced_date: NaiveDate,
        notes: Option<&str>,
    ) -> Result<ToggleOutcome> {
        let deleted = self.conn.execute(
            "DELETE FROM introduced_foods WHERE owner_id = ?1 AND food_id = ?2",
            params![owner_id, food_id],
        )?;
        if deleted > 0 {
            return Ok(ToggleOutcome { active: false });
        }

        let now = Local::now().to_rfc3339();
        let uuid = Uuid::new_v4().to_string();
        let date_str = introduced_date.format("%Y-%m-%d").to_string();
        self.conn.execute(
            "INSERT INTO introduced_foods (uuid, owner_id, profile_id, food_id, introduced_date,
                                           notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(owner_id, food_id) DO NOTHING",
            params![uuid, owner_id, profile_id, food_id, date_str, notes, now],
        )?;
        Ok(ToggleOutcome { active: true })
    }

    pub fn toggle_recipe_favorite(&self, owner_id: i64, recipe_id: i64) -> Result<ToggleOutcome> {
        let deleted = self.conn.execute(
            "DELETE FROM recipe_favorites WHERE owner_id = ?1 AND recipe_id = ?2",
            params![owner_id, recipe_id],
        )?;
        if deleted > 0 {
            return Ok(ToggleOutcome { active: false });
        }

        let now = Local::now().to_rfc3339();
        let uuid = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO recipe_favorites (uuid, owner_id, recipe_id, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(owner_id, recipe_id) DO NOTHING",
            params![uuid, owner_id, recipe_id, now],
        )?;
        Ok(ToggleOutcome { active: true })
    }

    pub fn get_introduced_food(
        &self,
        owner_id: i64,
        food_id: i64,
    ) -> Result<Option<IntroducedFood>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, uuid, owner_id, profile_id, food_id, introduced_date, notes, created_at
             FROM introduced_foods WHERE owner_id = ?1 AND food_id = ?2",
        )?;
        let mut rows = stmt.query(params![owner_id, food_id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(IntroducedFood {
                id: row.get(0)?,
                uuid: row.get(1)?,
                owner_id: row.get(2)?,
                profile_id: row.get(3)?,
                food_id: row.get(4)?,
                introduced_date: Self::date_col(row, 5)?,
                notes: row.get(6)?,
                created_at: row.get(7)?,
            }))
        } else {
            Ok(None)
        }
    }

    /// Set the tried flag for (owner, recipe). Returns true when this call
    /// transitioned the recipe from not-tried to tried.
    pub fn set_recipe_tried(&self, owner_id: i64, recipe_id: i64, tried: bool) -> Result<bool> {
        let previous: Option<i64> = {
            let mut stmt = self.conn.prepare(
                "SELECT tried FROM recipe_interactions WHERE owner_id = ?1 AND recipe_id = ?2",
            )?;
            let mut rows = stmt.query(params![owner_id, recipe_id])?;
            match rows.next()? {
                Some(row) => Some(row.get(0)?),
                None => None,
            }
        };

        let now = Local::now().to_rfc3339();
        let uuid = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO recipe_interactions (uuid, owner_id, recipe_id, tried, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(owner_id, recipe_id) DO UPDATE SET
                 tried = excluded.tried,
                 updated_at = excluded.updated_at",
            params![uuid, owner_id, recipe_id, i64::from(tried), now],
        )?;

        Ok(tried && previous.unwrap_or(0) == 0)
    }

    // --- Counts ---

    pub fn count_introduced_foods(&self, owner_id: i64) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM introduced_foods WHERE owner_id = ?1",
            params![owner_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn count_favorites(&self, owner_id: i64) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM recipe_favorites WHERE owner_id = ?1",
            params![owner_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn count_recipes_tried(&self, owner_id: i64) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM recipe_interactions WHERE owner_id = ?1 AND tried = 1",
            params![owner_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // --- Activity log ---

    pub fn record_activity(
        &self,
        owner_id: i64,
        kind: ActivityKind,
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO user_activities (owner_id, timestamp, kind) VALUES (?1, ?2, ?3)",
            params![owner_id, timestamp.to_rfc3339(), kind.as_str()],
        )?;
        Ok(())
    }

    pub fn activity_timestamps(&self, owner_id: i64) -> Result<Vec<DateTime<Utc>>> {
        let mut stmt = self.conn.prepare(
            "SELECT timestamp FROM user_activities WHERE owner_id = ?1 ORDER BY timestamp",
        )?;
        let timestamps = stmt
            .query_map(params![owner_id], |row| Self::timestamp_col(row, 0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(timestamps)
    }

    pub fn list_activities(&self, owner_id: i64) -> Result<Vec<ActivityRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner_id, timestamp, kind FROM user_activities
             WHERE owner_id = ?1 ORDER BY timestamp",
        )?;
        let records = stmt
            .query_map(params![owner_id], |row| {
                let kind_raw: String = row.get(3)?;
                let kind = ActivityKind::parse(&kind_raw).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        3,
                        rusqlite::types::Type::Text,
                        Box::new(std::io::Error::other(e.to_string())),
                    )
                })?;
                Ok(ActivityRecord {
                    id: row.get(0)?,
                    owner_id: row.get(1)?,
                    timestamp: Self::timestamp_col(row, 2)?,
                    kind,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    // --- Progress (derived cache) ---

    pub fn get_progress(&self, owner_id: i64) -> Result<Option<UserProgress>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, uuid, owner_id, total_points, current_streak, longest_streak,
                    last_activity_date, level_progress, feeding_level, achievements, updated_at
             FROM user_progress WHERE owner_id = ?1",
        )?;
        let mut rows = stmt.query(params![owner_id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::progress_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn upsert_progress(
        &self,
        owner_id: i64,
        snapshot: &ProgressSnapshot,
    ) -> Result<UserProgress> {
        let now = Local::now().to_rfc3339();
        let uuid = Uuid::new_v4().to_string();
        let last_activity = snapshot
            .last_activity_date
            .map(|d| d.format("%Y-%m-%d").to_string());
        self.conn.execute(
            "INSERT INTO user_progress (uuid, owner_id, total_points, current_streak,
                                        longest_streak, last_activity_date, level_progress,
                                        feeding_level, achievements, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(owner_id) DO UPDATE SET
                 total_points = excluded.total_points,
                 current_streak = excluded.current_streak,
                 longest_streak = excluded.longest_streak,
                 last_activity_date = excluded.last_activity_date,
                 level_progress = excluded.level_progress,
                 feeding_level = excluded.feeding_level,
                 achievements = excluded.achievements,
                 updated_at = excluded.updated_at",
            params![
                uuid,
                owner_id,
                snapshot.total_points,
                snapshot.current_streak,
                snapshot.longest_streak,
                last_activity,
                snapshot.level_progress,
                snapshot.feeding_level,
                serde_json::to_string(&snapshot.achievements)?,
                now,
            ],
        )?;
        self.get_progress(owner_id)?
            .ok_or_else(|| SproutError::not_found("progress", owner_id.to_string()))
    }

    // --- Tips ---

    pub fn upsert_tip(&self, tip: &NewTip) -> Result<()> {
        self.conn.execute(
            "INSERT INTO tips (title, description, age_range) VALUES (?1, ?2, ?3)
             ON CONFLICT(title) DO UPDATE SET
                 description = excluded.description,
                 age_range = excluded.age_range",
            params![tip.title, tip.description, tip.age_range],
        )?;
        Ok(())
    }

    pub fn random_tip(&self) -> Result<Option<Tip>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, description, age_range FROM tips ORDER BY RANDOM() LIMIT 1",
        )?;
        let mut rows = stmt.query([])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Tip {
                id: row.get(0)?,
                title: row.get(1)?,
                description: row.get(2)?,
                age_range: row.get(3)?,
            }))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewBabyProfile;

    fn sample_food(name: &str) -> NewFood {
        NewFood {
            name: name.to_string(),
            food_type: Some("Vegetable".to_string()),
            age_suggestion: Some("6 months+".to_string()),
            allergen_info: None,
            choking_hazard_info: None,
            iron_rich: true,
        }
    }

    fn sample_recipe(title: &str) -> NewRecipe {
        NewRecipe {
            title: title.to_string(),
            description: Some("Smooth first puree".to_string()),
            ingredients: vec!["1 carrot".to_string(), "water".to_string()],
            method: vec!["Steam".to_string(), "Blend".to_string()],
            servings: Some(2),
            time: Some("15 min".to_string()),
            link: None,
        }
    }

    fn setup_owner_with_profile(db: &Database) -> (Owner, BabyProfile) {
        let owner = db.get_or_create_owner("alex").unwrap();
        let profile = db
            .upsert_profile(
                owner.id,
                &NewBabyProfile {
                    name: "Maya".to_string(),
                    birth_date: NaiveDate::from_ymd_opt(2025, 11, 2).unwrap(),
                    weight_kg: Some(7.4),
                    feeding_type: Some("mixed".to_string()),
                    allergies: vec!["peanut".to_string()],
                    ..NewBabyProfile::default()
                },
            )
            .unwrap();
        (owner, profile)
    }

    #[test]
    fn test_get_or_create_owner_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let a = db.get_or_create_owner("alex").unwrap();
        let b = db.get_or_create_owner("alex").unwrap();
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_profile_upsert_keeps_one_row() {
        let db = Database::open_in_memory().unwrap();
        let (owner, first) = setup_owner_with_profile(&db);

        let updated = db
            .upsert_profile(
                owner.id,
                &NewBabyProfile {
                    name: "Maya".to_string(),
                    birth_date: NaiveDate::from_ymd_opt(2025, 11, 2).unwrap(),
                    weight_kg: Some(8.1),
                    ..NewBabyProfile::default()
                },
            )
            .unwrap();
        assert_eq!(updated.id, first.id);
        assert_eq!(updated.weight_kg, Some(8.1));
        assert!(updated.allergies.is_empty());
    }

    #[test]
    fn test_profile_lists_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let (owner, _) = setup_owner_with_profile(&db);
        let profile = db.get_profile(owner.id).unwrap().unwrap();
        assert_eq!(profile.allergies, vec!["peanut".to_string()]);
        assert!(profile.feeding_goals.is_empty());
    }

    #[test]
    fn test_toggle_introduced_twice_is_identity() {
        let db = Database::open_in_memory().unwrap();
        let (owner, profile) = setup_owner_with_profile(&db);
        let food = db.upsert_food(&sample_food("Carrot")).unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();

        let on = db
            .toggle_introduced_food(owner.id, profile.id, food.id, date, Some("loved it"))
            .unwrap();
        assert!(on.active);
        assert_eq!(db.count_introduced_foods(owner.id).unwrap(), 1);

        let off = db
            .toggle_introduced_food(owner.id, profile.id, food.id, date, None)
            .unwrap();
        assert!(!off.active);
        assert_eq!(db.count_introduced_foods(owner.id).unwrap(), 0);
        assert!(db.get_introduced_food(owner.id, food.id).unwrap().is_none());
    }

    #[test]
    fn test_introduced_unique_constraint_fails_closed() {
        let db = Database::open_in_memory().unwrap();
        let (owner, profile) = setup_owner_with_profile(&db);
        let food = db.upsert_food(&sample_food("Carrot")).unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();

        db.toggle_introduced_food(owner.id, profile.id, food.id, date, None)
            .unwrap();
        // A raced duplicate insert hits ON CONFLICT DO NOTHING.
        db.conn
            .execute(
                "INSERT INTO introduced_foods (uuid, owner_id, profile_id, food_id,
                                               introduced_date, notes, created_at)
                 VALUES ('x', ?1, ?2, ?3, '2026-05-01', NULL, 'now')
                 ON CONFLICT(owner_id, food_id) DO NOTHING",
                params![owner.id, profile.id, food.id],
            )
            .unwrap();
        assert_eq!(db.count_introduced_foods(owner.id).unwrap(), 1);
    }

    #[test]
    fn test_toggle_favorite_twice_is_identity() {
        let db = Database::open_in_memory().unwrap();
        let owner = db.get_or_create_owner("alex").unwrap();
        let recipe = db.upsert_recipe(&sample_recipe("Carrot Puree")).unwrap();

        assert!(db.toggle_recipe_favorite(owner.id, recipe.id).unwrap().active);
        assert_eq!(db.count_favorites(owner.id).unwrap(), 1);
        assert!(!db.toggle_recipe_favorite(owner.id, recipe.id).unwrap().active);
        assert_eq!(db.count_favorites(owner.id).unwrap(), 0);
    }

    #[test]
    fn test_owner_scoping_is_independent() {
        let db = Database::open_in_memory().unwrap();
        let (alex, profile) = setup_owner_with_profile(&db);
        let sam = db.get_or_create_owner("sam").unwrap();
        let food = db.upsert_food(&sample_food("Carrot")).unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();

        db.toggle_introduced_food(alex.id, profile.id, food.id, date, None)
            .unwrap();
        assert_eq!(db.count_introduced_foods(alex.id).unwrap(), 1);
        assert_eq!(db.count_introduced_foods(sam.id).unwrap(), 0);
    }

    #[test]
    fn test_set_recipe_tried_transitions_once() {
        let db = Database::open_in_memory().unwrap();
        let owner = db.get_or_create_owner("alex").unwrap();
        let recipe = db.upsert_recipe(&sample_recipe("Carrot Puree")).unwrap();

        assert!(db.set_recipe_tried(owner.id, recipe.id, true).unwrap());
        // Marking tried again is not a new transition.
        assert!(!db.set_recipe_tried(owner.id, recipe.id, true).unwrap());
        assert_eq!(db.count_recipes_tried(owner.id).unwrap(), 1);

        assert!(!db.set_recipe_tried(owner.id, recipe.id, false).unwrap());
        assert_eq!(db.count_recipes_tried(owner.id).unwrap(), 0);
        assert!(db.set_recipe_tried(owner.id, recipe.id, true).unwrap());
    }

    #[test]
    fn test_list_foods_filters() {
        let db = Database::open_in_memory().unwrap();
        let (owner, profile) = setup_owner_with_profile(&db);
        db.upsert_food(&sample_food("Carrot")).unwrap();
        db.upsert_food(&NewFood {
            food_type: Some("Fruit".to_string()),
            ..sample_food("Banana")
        })
        .unwrap();
        let carrot = db.get_food_by_name("Carrot").unwrap().unwrap();
        db.toggle_introduced_food(
            owner.id,
            profile.id,
            carrot.id,
            NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
            None,
        )
        .unwrap();

        let all = db.list_foods(owner.id, None, None, false).unwrap();
        assert_eq!(all.len(), 2);
        // Name-sorted: Banana before Carrot.
        assert_eq!(all[0].food.name, "Banana");
        assert!(!all[0].introduced);
        assert!(all[1].introduced);

        let veg = db
            .list_foods(owner.id, None, Some("Vegetable"), false)
            .unwrap();
        assert_eq!(veg.len(), 1);
        assert_eq!(veg[0].food.name, "Carrot");

        let introduced = db.list_foods(owner.id, None, None, true).unwrap();
        assert_eq!(introduced.len(), 1);

        let searched = db.list_foods(owner.id, Some("ban"), None, false).unwrap();
        assert_eq!(searched.len(), 1);
        assert_eq!(searched[0].food.name, "Banana");
    }

    #[test]
    fn test_list_recipes_with_status() {
        let db = Database::open_in_memory().unwrap();
        let owner = db.get_or_create_owner("alex").unwrap();
        db.upsert_recipe(&sample_recipe("Carrot Puree")).unwrap();
        db.upsert_recipe(&sample_recipe("Apple Porridge")).unwrap();
        let puree = db.get_recipe_by_title("Carrot Puree").unwrap().unwrap();
        db.toggle_recipe_favorite(owner.id, puree.id).unwrap();
        db.set_recipe_tried(owner.id, puree.id, true).unwrap();

        let all = db.list_recipes(owner.id, None, false).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].recipe.title, "Apple Porridge");
        assert!(!all[0].favorite);
        assert!(all[1].favorite);
        assert!(all[1].tried);

        let favorites = db.list_recipes(owner.id, None, true).unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].recipe.title, "Carrot Puree");
    }

    #[test]
    fn test_activity_log_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let owner = db.get_or_create_owner("alex").unwrap();
        let t1 = DateTime::parse_from_rfc3339("2026-05-01T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let t2 = DateTime::parse_from_rfc3339("2026-05-02T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        db.record_activity(owner.id, ActivityKind::FoodIntroduced, t1)
            .unwrap();
        db.record_activity(owner.id, ActivityKind::RecipeTried, t2)
            .unwrap();

        let timestamps = db.activity_timestamps(owner.id).unwrap();
        assert_eq!(timestamps, vec![t1, t2]);

        let records = db.list_activities(owner.id).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, ActivityKind::FoodIntroduced);
        assert_eq!(records[1].kind, ActivityKind::RecipeTried);
    }

    #[test]
    fn test_progress_missing_is_none_not_error() {
        let db = Database::open_in_memory().unwrap();
        let owner = db.get_or_create_owner("alex").unwrap();
        assert!(db.get_progress(owner.id).unwrap().is_none());
    }

    #[test]
    fn test_progress_upsert_keeps_one_row() {
        let db = Database::open_in_memory().unwrap();
        let owner = db.get_or_create_owner("alex").unwrap();
        let snapshot = ProgressSnapshot {
            total_points: 30,
            current_streak: 2,
            longest_streak: 4,
            last_activity_date: NaiveDate::from_ymd_opt(2026, 5, 2),
            level_progress: 60,
            feeding_level: "Curious Parent".to_string(),
            achievements: vec!["first_food".to_string()],
        };
        let first = db.upsert_progress(owner.id, &snapshot).unwrap();
        assert_eq!(first.total_points, 30);

        let second = db
            .upsert_progress(
                owner.id,
                &ProgressSnapshot {
                    total_points: 45,
                    ..snapshot
                },
            )
            .unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.total_points, 45);
        assert_eq!(second.achievements, vec!["first_food".to_string()]);
    }

    #[test]
    fn test_random_tip() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.random_tip().unwrap().is_none());

        db.upsert_tip(&NewTip {
            title: "Iron first".to_string(),
            description: "Offer iron-rich foods early and often.".to_string(),
            age_range: Some("6-12 months".to_string()),
        })
        .unwrap();
        let tip = db.random_tip().unwrap().unwrap();
        assert_eq!(tip.title, "Iron first");
    }
}
