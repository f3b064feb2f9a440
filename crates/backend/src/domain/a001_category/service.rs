use contracts::domain::a001_category::hierarchy::{
    dependent_children, find_parent, level, level_name, plan_move, rehome_descendants,
    validate_hierarchy,
};
use contracts::domain::a001_category::tree::{build_tree, filter_tree, hierarchy_stats};
use contracts::domain::a001_category::{
    CategoryDto, CategoryRecord, CategoryTreeNode, DeletionCheck, HierarchyStats,
    MoveCategoryDto, MovePlan, PlannedUpdate,
};
use contracts::domain::common::AggregateRoot;

use super::error::CategoryServiceError;
use super::repository::CategoryStore;
use crate::domain::a002_product::ProductStore;

type Result<T> = std::result::Result<T, CategoryServiceError>;

/// Фильтр списка: отрасль и строка поиска
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct CategoryQuery {
    pub industry_code: Option<String>,
    pub q: Option<String>,
}

impl CategoryQuery {
    fn industry(&self) -> Option<&str> {
        non_empty(self.industry_code.as_deref())
    }

    fn search(&self) -> Option<&str> {
        non_empty(self.q.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Область поиска родителей для записи: её отрасль, без отрасли - весь справочник
fn scope_of(record: &CategoryRecord) -> Option<&str> {
    non_empty(record.industry_code.as_deref())
}

/// Ошибки непрерывности плюс требование хотя бы одного уровня
pub(crate) fn validation_errors(record: &CategoryRecord) -> Vec<String> {
    let mut errors = validate_hierarchy(record);
    if level(record) == 0 {
        errors.insert(0, "category level 1 must be filled".to_string());
    }
    errors
}

pub async fn list(store: &dyn CategoryStore, query: &CategoryQuery) -> Result<Vec<CategoryRecord>> {
    let records = store.list_categories(query.industry()).await?;
    let Some(search) = query.search() else {
        return Ok(records);
    };
    let search = search.to_lowercase();
    Ok(records
        .into_iter()
        .filter(|r| {
            r.breadcrumb.to_lowercase().contains(&search)
                || r.category_code.to_lowercase().contains(&search)
                || r
                    .product_type
                    .as_deref()
                    .is_some_and(|t| t.to_lowercase().contains(&search))
        })
        .collect())
}

/// Дерево строится по полной выборке; поиск применяется уже к дереву,
/// чтобы совпавшие узлы не теряли предков
pub async fn tree(store: &dyn CategoryStore, query: &CategoryQuery) -> Result<Vec<CategoryTreeNode>> {
    let records = store.list_categories(query.industry()).await?;
    let nodes = build_tree(&records);
    Ok(match query.search() {
        Some(search) => filter_tree(nodes, search),
        None => nodes,
    })
}

pub async fn stats(store: &dyn CategoryStore, industry_code: Option<&str>) -> Result<HierarchyStats> {
    let records = store.list_categories(non_empty(industry_code)).await?;
    Ok(hierarchy_stats(&records))
}

pub async fn get(store: &dyn CategoryStore, code: &str) -> Result<CategoryRecord> {
    store
        .get_category(code)
        .await?
        .ok_or_else(|| CategoryServiceError::NotFound(code.to_string()))
}

pub async fn parent_of(store: &dyn CategoryStore, code: &str) -> Result<Option<CategoryRecord>> {
    let record = get(store, code).await?;
    let all = store.list_categories(scope_of(&record)).await?;
    Ok(find_parent(&all, &record).cloned())
}

pub async fn create(store: &dyn CategoryStore, dto: CategoryDto) -> Result<CategoryRecord> {
    let mut record = dto.into_record();

    let errors = validation_errors(&record);
    if !errors.is_empty() {
        return Err(CategoryServiceError::Validation(errors));
    }

    record.category_code = CategoryRecord::generate_code();
    record.refresh_breadcrumb();
    record.before_write();

    let created = store.create_category(&record).await?;
    tracing::info!(
        "Created category {} ({})",
        created.category_code,
        created.breadcrumb
    );
    Ok(created)
}

/// Изменение полей записи. Если изменился путь, потомки переносятся вместе с ней.
pub async fn update(
    store: &dyn CategoryStore,
    code: &str,
    dto: CategoryDto,
) -> Result<CategoryRecord> {
    let old = get(store, code).await?;
    let mut record = old.clone();
    dto.apply_to(&mut record);

    let errors = validation_errors(&record);
    if !errors.is_empty() {
        return Err(CategoryServiceError::Validation(errors));
    }

    let cascaded = write_with_descendants(store, &old, &mut record).await?;
    if !cascaded.is_empty() {
        tracing::info!(
            "Category {} renamed, {} descendants re-homed",
            code,
            cascaded.len()
        );
    }
    Ok(record)
}

/// Запись изменённой категории. Если изменился путь, потомки `old`
/// переносятся под новый путь в той же транзакции.
pub(crate) async fn write_with_descendants(
    store: &dyn CategoryStore,
    old: &CategoryRecord,
    record: &mut CategoryRecord,
) -> Result<Vec<PlannedUpdate>> {
    let cascaded = if record.levels != old.levels {
        let all = store.list_categories(scope_of(old)).await?;
        rehome_descendants(&all, old, &record.levels)?
    } else {
        Vec::new()
    };

    record.refresh_breadcrumb();
    record.before_write();
    let written = if cascaded.is_empty() {
        store.update_category(record).await?
    } else {
        store.update_with_descendants(record, &cascaded).await?
    };
    if !written {
        return Err(CategoryServiceError::NotFound(record.category_code.clone()));
    }
    Ok(cascaded)
}

/// Перемещение узла под нового родителя (или в корень) вместе с потомками
pub async fn move_category(
    store: &dyn CategoryStore,
    code: &str,
    dto: MoveCategoryDto,
) -> Result<MovePlan> {
    let moved = get(store, code).await?;
    let all = store.list_categories(scope_of(&moved)).await?;

    let new_parent = match non_empty(dto.new_parent_code.as_deref()) {
        Some(parent_code) => {
            let parent = all.iter().find(|r| r.category_code == parent_code);
            if parent.is_none() {
                // Родитель вне области записи: другой отрасли или не существует
                return Err(match store.get_category(parent_code).await? {
                    Some(_) => CategoryServiceError::validation(format!(
                        "parent category {} belongs to another industry",
                        parent_code
                    )),
                    None => CategoryServiceError::NotFound(parent_code.to_string()),
                });
            }
            parent
        }
        None => None,
    };

    let leaf_name = dto
        .leaf_name
        .unwrap_or_else(|| level_name(&moved).to_string());

    let plan = plan_move(&all, &moved, new_parent, &leaf_name)?;
    store.apply_hierarchy_updates(&plan.updates).await?;

    tracing::info!(
        "Moved category {} under {:?}: {} records updated",
        code,
        new_parent.map(|p| p.category_code.as_str()),
        plan.updates.len()
    );
    Ok(plan)
}

/// Можно ли удалить категорию: нет дочерних категорий и нет товаров со ссылкой на неё
pub async fn deletion_check(
    store: &dyn CategoryStore,
    products: &dyn ProductStore,
    code: &str,
) -> Result<DeletionCheck> {
    let record = get(store, code).await?;
    let all = store.list_categories(scope_of(&record)).await?;
    let child_codes = dependent_children(&all, &record)
        .into_iter()
        .map(|c| c.category_code.clone())
        .collect();
    let product_count = products.count_products_referencing(code).await?;
    Ok(DeletionCheck::new(record.category_code, child_codes, product_count))
}

pub async fn delete(
    store: &dyn CategoryStore,
    products: &dyn ProductStore,
    code: &str,
) -> Result<()> {
    let check = deletion_check(store, products, code).await?;
    if !check.child_codes.is_empty() {
        return Err(CategoryServiceError::HasChildren(check.child_codes));
    }
    if check.product_count > 0 {
        return Err(CategoryServiceError::ReferencedByProducts(check.product_count));
    }
    if !store.delete_category(code).await? {
        return Err(CategoryServiceError::NotFound(code.to_string()));
    }
    tracing::info!("Deleted category {}", code);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::testing::{category, MemoryCategoryStore, MemoryProductStore};
    use contracts::domain::a001_category::HierarchyError;

    fn tools_store() -> MemoryCategoryStore {
        MemoryCategoryStore::with_records(vec![
            category("T", &["Tools"]),
            category("H", &["Tools", "Hand Tools"]),
            category("HAM", &["Tools", "Hand Tools", "Hammers"]),
            category("G", &["Garden"]),
        ])
    }

    #[tokio::test]
    async fn create_assigns_code_and_breadcrumb() {
        let store = MemoryCategoryStore::default();
        let dto = CategoryDto {
            category_1: Some("Tools".into()),
            category_2: Some("Saws".into()),
            ..CategoryDto::default()
        };
        let created = create(&store, dto).await.unwrap();
        assert!(created.category_code.starts_with("CAT-"));
        assert_eq!(created.breadcrumb, "Tools > Saws");
        assert!(created.metadata.created_at.is_some());
        assert_eq!(store.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn create_rejects_gaps_and_empty_records() {
        let store = MemoryCategoryStore::default();
        let gap = CategoryDto {
            category_1: Some("A".into()),
            category_3: Some("B".into()),
            ..CategoryDto::default()
        };
        match create(&store, gap).await {
            Err(CategoryServiceError::Validation(errors)) => {
                assert!(errors[0].contains("level 3"))
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(matches!(
            create(&store, CategoryDto::default()).await,
            Err(CategoryServiceError::Validation(_))
        ));
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn tree_is_built_from_full_scope() {
        let store = tools_store();
        let nodes = tree(&store, &CategoryQuery::default()).await.unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].children[0].children[0].category.category_code, "HAM");

        let query = CategoryQuery {
            q: Some("garden".into()),
            ..CategoryQuery::default()
        };
        let filtered = tree(&store, &query).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].category.category_code, "G");
    }

    #[tokio::test]
    async fn list_filters_by_search() {
        let store = tools_store();
        let query = CategoryQuery {
            q: Some("hand".into()),
            ..CategoryQuery::default()
        };
        let codes: Vec<_> = list(&store, &query)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.category_code)
            .collect();
        assert_eq!(codes, vec!["H", "HAM"]);
    }

    #[tokio::test]
    async fn move_cascades_and_persists() {
        let store = tools_store();
        let dto = MoveCategoryDto {
            new_parent_code: Some("G".into()),
            leaf_name: None,
        };
        let plan = move_category(&store, "H", dto).await.unwrap();
        assert_eq!(plan.updates.len(), 2);
        assert_eq!(store.breadcrumb_of("H").unwrap(), "Garden > Hand Tools");
        assert_eq!(
            store.breadcrumb_of("HAM").unwrap(),
            "Garden > Hand Tools > Hammers"
        );

        let parent = parent_of(&store, "HAM").await.unwrap().unwrap();
        assert_eq!(parent.category_code, "H");
    }

    #[tokio::test]
    async fn move_to_root_with_new_name() {
        let store = tools_store();
        let dto = MoveCategoryDto {
            new_parent_code: None,
            leaf_name: Some("Standalone".into()),
        };
        move_category(&store, "HAM", dto).await.unwrap();
        assert_eq!(store.breadcrumb_of("HAM").unwrap(), "Standalone");
    }

    #[tokio::test]
    async fn move_under_descendant_is_refused() {
        let store = tools_store();
        let dto = MoveCategoryDto {
            new_parent_code: Some("HAM".into()),
            leaf_name: None,
        };
        assert!(matches!(
            move_category(&store, "T", dto).await,
            Err(CategoryServiceError::Hierarchy(
                HierarchyError::MoveIntoDescendant { .. }
            ))
        ));
        assert_eq!(store.breadcrumb_of("T").unwrap(), "Tools");
    }

    #[tokio::test]
    async fn move_to_unknown_parent_is_not_found() {
        let store = tools_store();
        let dto = MoveCategoryDto {
            new_parent_code: Some("NOPE".into()),
            leaf_name: None,
        };
        assert!(matches!(
            move_category(&store, "H", dto).await,
            Err(CategoryServiceError::NotFound(code)) if code == "NOPE"
        ));
    }

    #[tokio::test]
    async fn rename_cascades_to_descendants() {
        let store = tools_store();
        let dto = CategoryDto {
            category_2: Some("Manual Tools".into()),
            ..CategoryDto::default()
        };
        let updated = update(&store, "H", dto).await.unwrap();
        assert_eq!(updated.breadcrumb, "Tools > Manual Tools");
        assert_eq!(
            store.breadcrumb_of("HAM").unwrap(),
            "Tools > Manual Tools > Hammers"
        );
    }

    #[tokio::test]
    async fn failed_cascade_leaves_rename_unapplied() {
        let store = MemoryCategoryStore::failing_hierarchy_writes(vec![
            category("T", &["Tools"]),
            category("H", &["Tools", "Hand Tools"]),
            category("HAM", &["Tools", "Hand Tools", "Hammers"]),
        ]);
        let dto = CategoryDto {
            category_2: Some("Manual Tools".into()),
            ..CategoryDto::default()
        };
        assert!(matches!(
            update(&store, "H", dto).await,
            Err(CategoryServiceError::Storage(_))
        ));
        assert_eq!(store.breadcrumb_of("H").unwrap(), "Tools > Hand Tools");
        assert_eq!(
            store.breadcrumb_of("HAM").unwrap(),
            "Tools > Hand Tools > Hammers"
        );
    }

    #[tokio::test]
    async fn move_under_parent_of_other_industry_is_refused() {
        let mut tools = category("T", &["Tools"]);
        tools.industry_code = Some("HARDWARE".into());
        let mut saws = category("S", &["Saws"]);
        saws.industry_code = Some("HARDWARE".into());
        let mut garden = category("G", &["Garden"]);
        garden.industry_code = Some("OUTDOOR".into());
        let store = MemoryCategoryStore::with_records(vec![tools, saws, garden]);

        let dto = MoveCategoryDto {
            new_parent_code: Some("G".into()),
            leaf_name: None,
        };
        match move_category(&store, "S", dto).await {
            Err(CategoryServiceError::Validation(errors)) => {
                assert!(errors[0].contains("another industry"))
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(store.breadcrumb_of("S").unwrap(), "Saws");

        let dto = MoveCategoryDto {
            new_parent_code: Some("T".into()),
            leaf_name: None,
        };
        move_category(&store, "S", dto).await.unwrap();
        assert_eq!(store.breadcrumb_of("S").unwrap(), "Tools > Saws");
    }

    #[tokio::test]
    async fn update_of_unknown_code_is_not_found() {
        let store = tools_store();
        assert!(matches!(
            update(&store, "NOPE", CategoryDto::default()).await,
            Err(CategoryServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_is_guarded_by_children_and_products() {
        let store = tools_store();
        let products = MemoryProductStore::referencing("HAM", 2);

        match delete(&store, &products, "H").await {
            Err(CategoryServiceError::HasChildren(children)) => assert_eq!(children, vec!["HAM"]),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(matches!(
            delete(&store, &products, "HAM").await,
            Err(CategoryServiceError::ReferencedByProducts(2))
        ));

        let check = deletion_check(&store, &products, "G").await.unwrap();
        assert!(check.can_delete);
        delete(&store, &products, "G").await.unwrap();
        assert_eq!(store.snapshot().len(), 3);
    }

    #[tokio::test]
    async fn stats_cover_scope() {
        let store = tools_store();
        let stats = stats(&store, None).await.unwrap();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.roots, 2);
        assert_eq!(stats.orphans, 0);
        assert_eq!(stats.max_depth, 3);
    }
}
