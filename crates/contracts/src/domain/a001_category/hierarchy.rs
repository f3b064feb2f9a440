//! Движок иерархии категорий.
//!
//! Родитель не хранится явно: он каждый раз выводится из плоских колонок
//! `category_1..8` по совпадению префикса. Все функции чистые и работают
//! над списком, который передал вызывающий код.

use std::collections::HashMap;
use thiserror::Error;

use super::aggregate::{
    CategoryLevels, CategoryRecord, HierarchyUpdate, MovePlan, PlannedUpdate, MAX_LEVELS,
};

/// Разделитель уровней в breadcrumb
pub const BREADCRUMB_SEPARATOR: &str = " > ";

/// Имя записи без заполненных уровней
pub const UNNAMED: &str = "Unnamed";

/// Ошибки операций, изменяющих иерархию
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    #[error("leaf name cannot be empty")]
    EmptyLeafName,

    #[error("category {code} would need {depth} levels, at most {max} are supported", max = MAX_LEVELS)]
    DepthExceeded { code: String, depth: usize },

    #[error("category {code} cannot be moved under itself")]
    MoveIntoSelf { code: String },

    #[error("category {code} cannot be moved under its descendant {parent_code}")]
    MoveIntoDescendant { code: String, parent_code: String },
}

// ============================================================================
// Breadcrumb / level
// ============================================================================

/// Непустые уровни записи, соединённые через " > "
pub fn breadcrumb(record: &CategoryRecord) -> String {
    breadcrumb_of(&record.levels)
}

pub fn breadcrumb_of(levels: &CategoryLevels) -> String {
    levels
        .iter()
        .filter(|name| !name.trim().is_empty())
        .collect::<Vec<_>>()
        .join(BREADCRUMB_SEPARATOR)
}

/// Индекс последнего заполненного уровня; 0 если не заполнен ни один
pub fn level(record: &CategoryRecord) -> usize {
    level_of(&record.levels)
}

pub fn level_of(levels: &CategoryLevels) -> usize {
    (1..=MAX_LEVELS)
        .rev()
        .find(|&n| levels.is_filled(n))
        .unwrap_or(0)
}

/// Название на собственном уровне записи или "Unnamed"
pub fn level_name(record: &CategoryRecord) -> &str {
    match level(record) {
        0 => UNNAMED,
        n => record.levels.get(n),
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Проверка непрерывности уровней: после пустого уровня не может идти заполненный.
/// Пустой список означает, что запись корректна.
pub fn validate_hierarchy(record: &CategoryRecord) -> Vec<String> {
    let mut errors = Vec::new();
    let mut gap_seen = false;
    for n in 1..=MAX_LEVELS {
        if !record.levels.is_filled(n) {
            gap_seen = true;
        } else if gap_seen {
            errors.push(format!(
                "category level {} cannot be filled when level {} is empty",
                n,
                n - 1
            ));
        }
    }
    errors
}

// ============================================================================
// Parent matching
// ============================================================================

/// Путь, по которому запись находит родителя: первые `level - 1` колонок.
/// Записи уровня 0 и 1 родителя не ищут.
fn parent_key(child: &CategoryRecord) -> Option<&[String]> {
    match level(child) {
        0 | 1 => None,
        n => Some(&child.levels.as_slice()[..n - 1]),
    }
}

/// Путь, под которым запись может быть родителем: её заполненный префикс.
/// Запись без кода родителем не бывает.
fn own_key(candidate: &CategoryRecord) -> Option<&[String]> {
    match level(candidate) {
        0 => None,
        _ if !candidate.has_code() => None,
        n => Some(&candidate.levels.as_slice()[..n]),
    }
}

/// Единое правило сопоставления родителя.
///
/// Кандидат подходит, если у него есть код, его уровень ровно на единицу
/// меньше уровня ребёнка и первые `level - 1` колонок совпадают побайтно.
/// Срезы разной длины не равны, так что уровень сверяется вместе с ключом.
fn is_parent_of(candidate: &CategoryRecord, child: &CategoryRecord) -> bool {
    match (own_key(candidate), parent_key(child)) {
        (Some(own), Some(wanted)) => own == wanted,
        _ => false,
    }
}

/// Позиция родителя в `all`; при нескольких кандидатах побеждает первый по порядку списка
pub fn find_parent_index(all: &[CategoryRecord], child: &CategoryRecord) -> Option<usize> {
    all.iter().position(|candidate| is_parent_of(candidate, child))
}

/// Родитель записи среди `all` или `None` (запись - корень или сирота)
pub fn find_parent<'a>(
    all: &'a [CategoryRecord],
    child: &CategoryRecord,
) -> Option<&'a CategoryRecord> {
    find_parent_index(all, child).map(|i| &all[i])
}

/// Позиции родителей всех записей списка за один проход.
///
/// Результат совпадает с `find_parent_index` для каждой записи: в индекс
/// ключей попадает первый по порядку кандидат.
pub fn parent_indices(all: &[CategoryRecord]) -> Vec<Option<usize>> {
    let mut by_key: HashMap<&[String], usize> = HashMap::new();
    for (i, record) in all.iter().enumerate() {
        if let Some(key) = own_key(record) {
            by_key.entry(key).or_insert(i);
        }
    }
    all.iter()
        .map(|child| parent_key(child).and_then(|key| by_key.get(key).copied()))
        .collect()
}

/// Позиция родителя -> позиции детей в порядке списка (по результату `parent_indices`)
pub fn children_map(parents: &[Option<usize>]) -> HashMap<usize, Vec<usize>> {
    let mut map: HashMap<usize, Vec<usize>> = HashMap::new();
    for (i, parent) in parents.iter().enumerate() {
        if let Some(p) = parent {
            map.entry(*p).or_default().push(i);
        }
    }
    map
}

/// Позиции непосредственных детей `record`: сама запись может и не входить в `all`
fn child_positions(
    all: &[CategoryRecord],
    parents: &[Option<usize>],
    record: &CategoryRecord,
) -> Vec<usize> {
    if !record.has_code() {
        return Vec::new();
    }
    parents
        .iter()
        .enumerate()
        .filter(|(_, parent)| {
            parent.is_some_and(|p| all[p].category_code == record.category_code)
        })
        .map(|(i, _)| i)
        .collect()
}

/// Записи, для которых `record` является непосредственным родителем
pub fn dependent_children<'a>(
    all: &'a [CategoryRecord],
    record: &CategoryRecord,
) -> Vec<&'a CategoryRecord> {
    let parents = parent_indices(all);
    child_positions(all, &parents, record)
        .into_iter()
        .map(|i| &all[i])
        .collect()
}

/// Все потомки записи: обход в ширину, внутри уровня - порядок входного списка
pub fn descendants<'a>(
    all: &'a [CategoryRecord],
    record: &CategoryRecord,
) -> Vec<&'a CategoryRecord> {
    let parents = parent_indices(all);
    let children = children_map(&parents);

    let mut result = Vec::new();
    let mut frontier = child_positions(all, &parents, record);
    while !frontier.is_empty() {
        let next: Vec<usize> = frontier
            .iter()
            .filter_map(|i| children.get(i))
            .flatten()
            .copied()
            .collect();
        result.extend(frontier.iter().map(|&i| &all[i]));
        frontier = next;
    }
    result
}

// ============================================================================
// Re-parenting
// ============================================================================

/// Поля, которые нужно записать, чтобы `moved` стал листом `new_leaf_name`
/// непосредственно под `new_parent` (или корнем, если родителя нет).
///
/// Собственные подуровни перемещаемой записи отбрасываются; потомков
/// переносит `rehome_descendants`.
pub fn update_hierarchy(
    moved: &CategoryRecord,
    new_parent: Option<&CategoryRecord>,
    new_leaf_name: &str,
) -> Result<HierarchyUpdate, HierarchyError> {
    if new_leaf_name.trim().is_empty() {
        return Err(HierarchyError::EmptyLeafName);
    }

    let mut levels = CategoryLevels::default();
    match new_parent {
        Some(parent) => {
            let p = level(parent);
            let new_level = p + 1;
            if new_level > MAX_LEVELS {
                return Err(HierarchyError::DepthExceeded {
                    code: moved.category_code.clone(),
                    depth: new_level,
                });
            }
            for i in 1..=p {
                levels.set(i, parent.levels.get(i));
            }
            levels.set(new_level, new_leaf_name);
        }
        None => levels.set(1, new_leaf_name),
    }

    Ok(HierarchyUpdate::new(levels))
}

/// Перенос потомков `old` под новый путь `new_levels`.
///
/// У каждого потомка первые `level(old)` колонок заменяются заполненным
/// префиксом `new_levels`, собственный хвост потомка сохраняется.
pub fn rehome_descendants(
    all: &[CategoryRecord],
    old: &CategoryRecord,
    new_levels: &CategoryLevels,
) -> Result<Vec<PlannedUpdate>, HierarchyError> {
    let old_level = level(old);
    let new_level = level_of(new_levels);

    descendants(all, old)
        .into_iter()
        .map(|d| {
            let own_level = level(d);
            let depth = new_level + own_level.saturating_sub(old_level);
            if depth > MAX_LEVELS {
                return Err(HierarchyError::DepthExceeded {
                    code: d.category_code.clone(),
                    depth,
                });
            }

            let mut levels = CategoryLevels::default();
            for i in 1..=new_level {
                levels.set(i, new_levels.get(i));
            }
            for (offset, i) in (old_level + 1..=own_level).enumerate() {
                levels.set(new_level + 1 + offset, d.levels.get(i));
            }

            Ok(PlannedUpdate {
                category_code: d.category_code.clone(),
                update: HierarchyUpdate::new(levels),
            })
        })
        .collect()
}

/// Полный план перемещения: сам узел и каскадное обновление его потомков.
///
/// Отказывает, если новый родитель - сам узел или один из его потомков.
pub fn plan_move(
    all: &[CategoryRecord],
    moved: &CategoryRecord,
    new_parent: Option<&CategoryRecord>,
    new_leaf_name: &str,
) -> Result<MovePlan, HierarchyError> {
    if let Some(parent) = new_parent {
        if parent.category_code == moved.category_code {
            return Err(HierarchyError::MoveIntoSelf {
                code: moved.category_code.clone(),
            });
        }
        if descendants(all, moved)
            .iter()
            .any(|d| d.category_code == parent.category_code)
        {
            return Err(HierarchyError::MoveIntoDescendant {
                code: moved.category_code.clone(),
                parent_code: parent.category_code.clone(),
            });
        }
    }

    let own = update_hierarchy(moved, new_parent, new_leaf_name)?;
    let cascaded = rehome_descendants(all, moved, &own.levels)?;

    let mut updates = Vec::with_capacity(cascaded.len() + 1);
    updates.push(PlannedUpdate {
        category_code: moved.category_code.clone(),
        update: own,
    });
    updates.extend(cascaded);
    Ok(MovePlan { updates })
}
