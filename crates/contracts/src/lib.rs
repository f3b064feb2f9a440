//! Общие типы backend'а и его клиентов: записи справочников и чистая
//! логика иерархии категорий.

pub mod domain;
