use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250101_000002_create_extension_unique_keys_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ExtensionUniqueKeys::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ExtensionUniqueKeys::IndexName).string_len(255).not_null())
                    .col(ColumnDef::new(ExtensionUniqueKeys::IndexValue).string_len(255).not_null())
                    .col(ColumnDef::new(ExtensionUniqueKeys::Owner).string_len(255).not_null())
                    .primary_key(
                        Index::create()
                            .col(ExtensionUniqueKeys::IndexName)
                            .col(ExtensionUniqueKeys::IndexValue),
                    )
                    .to_owned(),
            )
            .await?;

        // 批次提交时按owner释放旧索引
        manager
            .create_index(
                Index::create()
                    .name("idx_extension_unique_keys_owner")
                    .table(ExtensionUniqueKeys::Table)
                    .col(ExtensionUniqueKeys::Owner)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ExtensionUniqueKeys::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ExtensionUniqueKeys {
    Table,
    IndexName,
    IndexValue,
    Owner,
}
