use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ========================================
        // LABELS TABLE
        // ========================================
        manager
            .create_table(
                Table::create()
                    .table(Labels::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Labels::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Labels::ProjectId).big_integer().not_null())
                    .col(ColumnDef::new(Labels::ExternalId).big_integer().not_null())
                    .col(ColumnDef::new(Labels::Name).string().not_null())
                    .col(ColumnDef::new(Labels::Color).string().null())
                    .col(ColumnDef::new(Labels::Description).string().null())
                    .col(
                        ColumnDef::new(Labels::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // The bulk persister pre-filters on this natural key; the constraint
        // backs the all-or-nothing batched insert.
        manager
            .create_index(
                Index::create()
                    .name("idx_labels_project_name")
                    .table(Labels::Table)
                    .col(Labels::ProjectId)
                    .col(Labels::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ========================================
        // MILESTONES TABLE
        // ========================================
        manager
            .create_table(
                Table::create()
                    .table(Milestones::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Milestones::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Milestones::ProjectId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Milestones::ExternalId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Milestones::Title).string().not_null())
                    .col(ColumnDef::new(Milestones::Description).text().null())
                    .col(ColumnDef::new(Milestones::State).string().not_null())
                    .col(
                        ColumnDef::new(Milestones::DueOn)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Milestones::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Milestones::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_milestones_project_title")
                    .table(Milestones::Table)
                    .col(Milestones::ProjectId)
                    .col(Milestones::Title)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ========================================
        // RELEASES TABLE
        // ========================================
        manager
            .create_table(
                Table::create()
                    .table(Releases::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Releases::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Releases::ProjectId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Releases::ExternalId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Releases::TagName).string().not_null())
                    .col(ColumnDef::new(Releases::Name).string().null())
                    .col(ColumnDef::new(Releases::Body).text().null())
                    .col(ColumnDef::new(Releases::AuthorId).big_integer().null())
                    .col(
                        ColumnDef::new(Releases::ReleasedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Releases::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_releases_project_tag")
                    .table(Releases::Table)
                    .col(Releases::ProjectId)
                    .col(Releases::TagName)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ========================================
        // ISSUES TABLE
        // ========================================
        manager
            .create_table(
                Table::create()
                    .table(Issues::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Issues::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Issues::ProjectId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Issues::ExternalIid)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Issues::Title).string().not_null())
                    .col(ColumnDef::new(Issues::Body).text().null())
                    .col(ColumnDef::new(Issues::State).string().not_null())
                    .col(ColumnDef::new(Issues::AuthorId).big_integer().not_null())
                    .col(ColumnDef::new(Issues::AssigneeId).big_integer().null())
                    .col(
                        ColumnDef::new(Issues::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Issues::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_issues_project_iid")
                    .table(Issues::Table)
                    .col(Issues::ProjectId)
                    .col(Issues::ExternalIid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ========================================
        // NOTES TABLE
        // ========================================
        manager
            .create_table(
                Table::create()
                    .table(Notes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Notes::ProjectId).big_integer().not_null())
                    .col(ColumnDef::new(Notes::ExternalId).big_integer().not_null())
                    .col(ColumnDef::new(Notes::NoteableType).string().not_null())
                    .col(ColumnDef::new(Notes::NoteableId).big_integer().not_null())
                    .col(ColumnDef::new(Notes::AuthorId).big_integer().not_null())
                    .col(ColumnDef::new(Notes::Body).text().not_null())
                    .col(
                        ColumnDef::new(Notes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Notes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_notes_project_external_id")
                    .table(Notes::Table)
                    .col(Notes::ProjectId)
                    .col(Notes::ExternalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ========================================
        // PULL_REQUESTS TABLE
        // ========================================
        manager
            .create_table(
                Table::create()
                    .table(PullRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PullRequests::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PullRequests::ProjectId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PullRequests::ExternalIid)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PullRequests::Title).string().not_null())
                    .col(ColumnDef::new(PullRequests::Body).text().null())
                    .col(ColumnDef::new(PullRequests::State).string().not_null())
                    .col(
                        ColumnDef::new(PullRequests::SourceBranch)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PullRequests::TargetBranch)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PullRequests::AuthorId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PullRequests::MergedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PullRequests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(PullRequests::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_pull_requests_project_iid")
                    .table(PullRequests::Table)
                    .col(PullRequests::ProjectId)
                    .col(PullRequests::ExternalIid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ========================================
        // COLLABORATORS TABLE
        // ========================================
        manager
            .create_table(
                Table::create()
                    .table(Collaborators::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Collaborators::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Collaborators::ProjectId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Collaborators::ExternalUserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Collaborators::Login).string().not_null())
                    .col(
                        ColumnDef::new(Collaborators::AccessLevel)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Collaborators::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_collaborators_project_user")
                    .table(Collaborators::Table)
                    .col(Collaborators::ProjectId)
                    .col(Collaborators::ExternalUserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ========================================
        // PROTECTED_BRANCHES TABLE
        // ========================================
        manager
            .create_table(
                Table::create()
                    .table(ProtectedBranches::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProtectedBranches::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ProtectedBranches::ProjectId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ProtectedBranches::Name).string().not_null())
                    .col(
                        ColumnDef::new(ProtectedBranches::AllowForcePush)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ProtectedBranches::RequireReviews)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ProtectedBranches::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_protected_branches_project_name")
                    .table(ProtectedBranches::Table)
                    .col(ProtectedBranches::ProjectId)
                    .col(ProtectedBranches::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ========================================
        // ATTACHMENTS TABLE
        // ========================================
        manager
            .create_table(
                Table::create()
                    .table(Attachments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Attachments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Attachments::ProjectId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Attachments::ExternalId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Attachments::RecordType).string().not_null())
                    .col(
                        ColumnDef::new(Attachments::RecordExternalId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Attachments::Url).string().not_null())
                    .col(
                        ColumnDef::new(Attachments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_attachments_project_external_id")
                    .table(Attachments::Table)
                    .col(Attachments::ProjectId)
                    .col(Attachments::ExternalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ========================================
        // PLACEHOLDER_REFERENCES TABLE
        // ========================================
        manager
            .create_table(
                Table::create()
                    .table(PlaceholderReferences::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PlaceholderReferences::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PlaceholderReferences::ProjectId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PlaceholderReferences::RecordTable)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PlaceholderReferences::RecordId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PlaceholderReferences::ColumnName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PlaceholderReferences::ExternalUserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PlaceholderReferences::ExternalLogin)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PlaceholderReferences::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Reconciliation scans by external identity.
        manager
            .create_index(
                Index::create()
                    .name("idx_placeholder_references_external_user")
                    .table(PlaceholderReferences::Table)
                    .col(PlaceholderReferences::ExternalUserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(PlaceholderReferences::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Attachments::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(ProtectedBranches::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(Collaborators::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(PullRequests::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Notes::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Issues::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Releases::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Milestones::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Labels::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Labels {
    Table,
    Id,
    ProjectId,
    ExternalId,
    Name,
    Color,
    Description,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Milestones {
    Table,
    Id,
    ProjectId,
    ExternalId,
    Title,
    Description,
    State,
    DueOn,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Releases {
    Table,
    Id,
    ProjectId,
    ExternalId,
    TagName,
    Name,
    Body,
    AuthorId,
    ReleasedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Issues {
    Table,
    Id,
    ProjectId,
    ExternalIid,
    Title,
    Body,
    State,
    AuthorId,
    AssigneeId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Notes {
    Table,
    Id,
    ProjectId,
    ExternalId,
    NoteableType,
    NoteableId,
    AuthorId,
    Body,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PullRequests {
    Table,
    Id,
    ProjectId,
    ExternalIid,
    Title,
    Body,
    State,
    SourceBranch,
    TargetBranch,
    AuthorId,
    MergedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Collaborators {
    Table,
    Id,
    ProjectId,
    ExternalUserId,
    Login,
    AccessLevel,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ProtectedBranches {
    Table,
    Id,
    ProjectId,
    Name,
    AllowForcePush,
    RequireReviews,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Attachments {
    Table,
    Id,
    ProjectId,
    ExternalId,
    RecordType,
    RecordExternalId,
    Url,
    CreatedAt,
}

#[derive(DeriveIden)]
enum PlaceholderReferences {
    Table,
    Id,
    ProjectId,
    RecordTable,
    RecordId,
    ColumnName,
    ExternalUserId,
    ExternalLogin,
    CreatedAt,
}
