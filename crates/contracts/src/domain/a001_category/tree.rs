use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::aggregate::{CategoryRecord, MAX_LEVELS};
use super::hierarchy::{children_map, level, parent_indices, validate_hierarchy};

/// Узел дерева категорий; существует только в памяти
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTreeNode {
    pub category: CategoryRecord,
    pub children: Vec<CategoryTreeNode>,
    pub level: usize,
}

/// Построение леса из плоского списка.
///
/// Родитель ищется по всему входному списку, а не по уже построенным узлам:
/// порядок импорта не гарантирует, что родитель идёт раньше ребёнка.
/// Корни: сначала записи уровня 1 в порядке списка, затем сироты
/// (и записи без уровней) в порядке списка.
pub fn build_tree(records: &[CategoryRecord]) -> Vec<CategoryTreeNode> {
    if records.is_empty() {
        return vec![];
    }

    // Группируем детей по позиции родителя
    let parents = parent_indices(records);
    let children_map = children_map(&parents);
    let mut top_level = Vec::new();
    let mut orphans = Vec::new();

    for (i, record) in records.iter().enumerate() {
        if level(record) == 1 {
            top_level.push(i);
        } else if parents[i].is_none() {
            orphans.push(i);
        }
    }

    fn build_node(
        i: usize,
        records: &[CategoryRecord],
        children_map: &HashMap<usize, Vec<usize>>,
    ) -> CategoryTreeNode {
        let children = children_map
            .get(&i)
            .map(|kids| {
                kids.iter()
                    .map(|&kid| build_node(kid, records, children_map))
                    .collect()
            })
            .unwrap_or_default();

        CategoryTreeNode {
            category: records[i].clone(),
            children,
            level: level(&records[i]),
        }
    }

    top_level
        .into_iter()
        .chain(orphans)
        .map(|i| build_node(i, records, &children_map))
        .collect()
}

/// Обход дерева в прямом порядке обратно в плоский список
pub fn flatten_tree(nodes: &[CategoryTreeNode]) -> Vec<&CategoryRecord> {
    let mut result = Vec::new();
    for node in nodes {
        result.push(&node.category);
        result.extend(flatten_tree(&node.children));
    }
    result
}

/// Минимальная длина поискового запроса
const MIN_QUERY_LEN: usize = 2;

/// Фильтрация дерева: узел остаётся, если совпал он сам или кто-то из потомков
pub fn filter_tree(nodes: Vec<CategoryTreeNode>, query: &str) -> Vec<CategoryTreeNode> {
    let query = query.trim();
    if query.chars().count() < MIN_QUERY_LEN {
        return nodes;
    }
    let query_lower = query.to_lowercase();
    filter_nodes(nodes, &query_lower)
}

fn filter_nodes(nodes: Vec<CategoryTreeNode>, query_lower: &str) -> Vec<CategoryTreeNode> {
    let mut result = Vec::new();

    for node in nodes {
        let category = &node.category;
        let matches = category.breadcrumb.to_lowercase().contains(query_lower)
            || category.category_code.to_lowercase().contains(query_lower)
            || category
                .product_type
                .as_deref()
                .is_some_and(|t| t.to_lowercase().contains(query_lower));

        let CategoryTreeNode {
            category,
            children,
            level,
        } = node;
        let filtered_children = filter_nodes(children, query_lower);

        if matches || !filtered_children.is_empty() {
            result.push(CategoryTreeNode {
                category,
                children: filtered_children,
                level,
            });
        }
    }

    result
}

// ============================================================================
// Dashboard aggregation
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCount {
    pub level: usize,
    pub count: usize,
}

/// Сводка по иерархии для дашборда
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyStats {
    pub total: usize,
    pub roots: usize,
    /// Записи без уровней или без найденного родителя
    pub orphans: usize,
    /// Записи с разрывом в уровнях
    pub invalid: usize,
    pub max_depth: usize,
    pub per_level: Vec<LevelCount>,
}

pub fn hierarchy_stats(records: &[CategoryRecord]) -> HierarchyStats {
    let mut counts = [0usize; MAX_LEVELS + 1];
    let mut stats = HierarchyStats {
        total: records.len(),
        ..HierarchyStats::default()
    };

    let parents = parent_indices(records);
    for (record, parent) in records.iter().zip(&parents) {
        let n = level(record);
        counts[n] += 1;
        stats.max_depth = stats.max_depth.max(n);

        if !validate_hierarchy(record).is_empty() {
            stats.invalid += 1;
        }
        if n == 1 {
            stats.roots += 1;
        } else if parent.is_none() {
            stats.orphans += 1;
        }
    }

    stats.per_level = counts
        .iter()
        .enumerate()
        .filter(|&(n, &count)| n > 0 || count > 0)
        .map(|(level, &count)| LevelCount { level, count })
        .collect();

    stats
}
