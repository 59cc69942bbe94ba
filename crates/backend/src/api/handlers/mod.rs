pub mod d500_accounts_payable;
